use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use xcc::cli::convert::OutputFormat;
use xcc::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ConversionArgs {
    /// Amount to convert
    #[arg(value_parser = parse_amount)]
    amount: f64,

    /// Currency to convert from (code or name, e.g. USD or "us dollars")
    from: String,

    /// Currencies to convert to; defaults to the configured currency
    to: Vec<String>,

    /// Print an HTML fragment instead of plain text
    #[arg(long)]
    html: bool,
}

impl ConversionArgs {
    fn format(&self) -> OutputFormat {
        if self.html {
            OutputFormat::Html
        } else {
            OutputFormat::Plain
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount using the latest exchange rates
    Convert(ConversionArgs),
    /// Keep a conversion up to date as rates refresh
    Watch(ConversionArgs),
    /// Show the latest exchange rates
    Rates {
        /// Only show these currencies
        codes: Vec<String>,
    },
    /// List known currencies
    Currencies,
}

impl From<Commands> for xcc::AppCommand {
    fn from(cmd: Commands) -> xcc::AppCommand {
        match cmd {
            Commands::Convert(args) => xcc::AppCommand::Convert {
                format: args.format(),
                amount: args.amount,
                from: args.from,
                to: args.to,
            },
            Commands::Watch(args) => xcc::AppCommand::Watch {
                format: args.format(),
                amount: args.amount,
                from: args.from,
                to: args.to,
            },
            Commands::Rates { codes } => xcc::AppCommand::Rates { codes },
            Commands::Currencies => xcc::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let amount: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("'{s}' must be a non-negative number"));
    }
    Ok(amount)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xcc::cli::setup::setup(),
        Some(cmd) => xcc::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
