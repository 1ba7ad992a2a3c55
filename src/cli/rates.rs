use super::ui;
use crate::core::{CurrencyDictionary, RateSnapshot, RateSource};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};

/// Builds the rate table for `codes`, or for every code in the snapshot when
/// `codes` is empty.
pub fn rates_table(
    snapshot: &RateSnapshot,
    dictionary: &CurrencyDictionary,
    codes: &[String],
) -> Table {
    let base = snapshot.base().unwrap_or("base");

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Flag"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per 1 {base})")),
    ]);

    let rows: Vec<String> = if codes.is_empty() {
        snapshot.codes().into_iter().map(String::from).collect()
    } else {
        codes.iter().map(|c| c.trim().to_uppercase()).collect()
    };

    for code in rows {
        table.add_row(vec![
            Cell::new(&code),
            Cell::new(dictionary.flag(&code).unwrap_or("")),
            Cell::new(dictionary.display_name(&code).unwrap_or("")),
            ui::format_optional_cell(snapshot.rate(&code), |r| format!("{r:.4}")),
        ]);
    }
    table
}

pub fn currencies_table(dictionary: &CurrencyDictionary) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Flag"),
        ui::header_cell("Name"),
        ui::header_cell("Also known as"),
    ]);

    for (code, info) in dictionary.iter() {
        let aliases: Vec<&str> = info.names().skip(1).collect();
        table.add_row(vec![
            Cell::new(code),
            Cell::new(info.flag.as_deref().unwrap_or("")).set_alignment(CellAlignment::Center),
            Cell::new(info.singular.first().map(String::as_str).unwrap_or("")),
            Cell::new(aliases.join(", ")),
        ]);
    }
    table
}

pub async fn run(
    source: &RateSource,
    dictionary: &CurrencyDictionary,
    codes: &[String],
) -> Result<()> {
    source.refresh().await;
    let snapshot = source.latest();

    if snapshot.is_empty() {
        println!(
            "{}",
            ui::style_text("No exchange rates available.", ui::StyleType::Error)
        );
        return Ok(());
    }

    let title = match (snapshot.date(), snapshot.fetched_at()) {
        (Some(date), _) => format!("Exchange rates for {date}"),
        (None, Some(fetched_at)) => {
            format!("Exchange rates fetched {}", fetched_at.format("%Y-%m-%d %H:%M UTC"))
        }
        (None, None) => "Exchange rates".to_string(),
    };
    println!("{}", ui::style_text(&title, ui::StyleType::Title));
    println!("{}", rates_table(&snapshot, dictionary, codes));
    Ok(())
}

pub fn list_currencies(dictionary: &CurrencyDictionary) {
    println!(
        "{} {}",
        ui::style_text("Known currencies:", ui::StyleType::Title),
        ui::style_text(&dictionary.len().to_string(), ui::StyleType::Value)
    );
    println!("{}", currencies_table(dictionary));
}
