//! Keeps the latest exchange rates fresh and hands them to subscribers.
//!
//! A [`RateSource`] is built once and shared. Subscribing returns the latest
//! known snapshot right away (empty until the first fetch succeeds) and starts
//! a poll task that fetches immediately and then once per interval. Each tick
//! fetches independently, so a slow fetch never delays the next one and the
//! last successful fetch wins. Failed fetches are logged and leave the current
//! snapshot alone. Polling stops once every subscription has been dropped.

use crate::core::rates::{RateFetcher, RateSnapshot};
use futures::Stream;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

type Poller = Arc<Mutex<Option<JoinHandle<()>>>>;

pub struct RateSource {
    fetcher: Arc<dyn RateFetcher>,
    interval: Duration,
    sender: Arc<watch::Sender<Arc<RateSnapshot>>>,
    poller: Poller,
}

impl RateSource {
    pub fn new(fetcher: Arc<dyn RateFetcher>, interval: Duration) -> Self {
        let (sender, _) = watch::channel(Arc::new(RateSnapshot::empty()));
        Self {
            fetcher,
            interval,
            sender: Arc::new(sender),
            poller: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Subscribes to rate updates, starting the poll task if needed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self) -> RateSubscription {
        let mut poller = lock(&self.poller);
        let receiver = self.sender.subscribe();
        if poller.is_none() {
            debug!(interval = ?self.interval, "Starting rate polling");
            *poller = Some(tokio::spawn(poll(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.sender),
                Arc::clone(&self.poller),
                self.interval,
            )));
        }
        RateSubscription { receiver }
    }

    /// Fetches once and publishes the result if it is usable.
    ///
    /// Returns whether a new snapshot was published.
    pub async fn refresh(&self) -> bool {
        publish(self.fetcher.as_ref(), &self.sender).await
    }

    /// The latest published snapshot, empty if no fetch has succeeded yet.
    pub fn latest(&self) -> Arc<RateSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.poller).is_some()
    }
}

impl Drop for RateSource {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.poller).take() {
            handle.abort();
        }
    }
}

/// A live view on the rates published by a [`RateSource`].
pub struct RateSubscription {
    receiver: watch::Receiver<Arc<RateSnapshot>>,
}

impl RateSubscription {
    /// The most recent snapshot, marking it as seen.
    pub fn current(&mut self) -> Arc<RateSnapshot> {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for a snapshot newer than the last one seen.
    ///
    /// Returns `None` once the source is gone and no more updates can arrive.
    pub async fn changed(&mut self) -> Option<Arc<RateSnapshot>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Turns the subscription into a stream that yields the current snapshot
    /// immediately and every new one after that.
    pub fn into_stream(self) -> impl Stream<Item = Arc<RateSnapshot>> {
        futures::stream::unfold((self, true), |(mut subscription, first)| async move {
            let next = if first {
                Some(subscription.current())
            } else {
                subscription.changed().await
            };
            next.map(|snapshot| (snapshot, (subscription, false)))
        })
    }
}

fn lock(poller: &Mutex<Option<JoinHandle<()>>>) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    poller.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn poll(
    fetcher: Arc<dyn RateFetcher>,
    sender: Arc<watch::Sender<Arc<RateSnapshot>>>,
    poller: Poller,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fetcher = Arc::clone(&fetcher);
                let sender = Arc::clone(&sender);
                tokio::spawn(async move {
                    publish(fetcher.as_ref(), &sender).await;
                });
            }
            _ = sender.closed() => {
                // Decided under the lock so a concurrent subscribe either sees
                // this task still registered or starts a new one.
                let mut poller = lock(&poller);
                if sender.receiver_count() == 0 {
                    debug!("No subscribers left, stopping rate polling");
                    poller.take();
                    return;
                }
            }
        }
    }
}

async fn publish(fetcher: &dyn RateFetcher, sender: &watch::Sender<Arc<RateSnapshot>>) -> bool {
    match fetcher.fetch_rates().await {
        Ok(snapshot) if !snapshot.is_empty() => {
            debug!(currencies = snapshot.len(), "Publishing new rate snapshot");
            sender.send_replace(Arc::new(snapshot));
            true
        }
        Ok(_) => {
            warn!("Rate provider returned no rates, keeping previous snapshot");
            false
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch exchange rates, keeping previous snapshot");
            false
        }
    }
}
