//! CLI argument definitions for fintec.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rates` | Current BCV or Binance rates through the fallback chain |
//! | `history` | Stored rate history for a source |
//! | `trends` | Day-over-day and 1d/1w/1m trends |
//! | `compare` | BCV against the Binance midpoint |
//! | `convert` | Convert an amount through USD |
//! | `format` | Render minor units as a currency string |
//! | `allocate` | Split minor units by ratios without losing cents |
//! | `intent` | Classify a chat message |
//! | `reply` | Classify a reply to a confirmation prompt |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Skip the network; serve history or static rates |
//! | `--lexicon` | built-in | JSON/YAML assistant lexicon |
//!
//! # Examples
//!
//! ```bash
//! fintec rates bcv --pretty
//! fintec convert 100 USD VES
//! fintec format 150000 VES --usd-equivalent
//! fintec intent "transferir 200 euros"
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fintec_core::RateSource;

/// Exchange rates, money and assistant intents for multi-currency bookkeeping
#[derive(Debug, Parser)]
#[command(
    name = "fintec",
    author,
    version,
    about = "Exchange rates, money and assistant intents",
    long_about = "fintec tracks the BCV official and Binance P2P bolívar rates with a \
fallback chain that always answers, converts and formats money without floating-point \
drift, and classifies Spanish/English chat messages into finance actions.\n\
\n\
Use 'fintec <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Do not call the rates API; answers come from history or static values.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Assistant lexicon, rules and confirmation policy (.json, .yaml or .yml).
    #[arg(long, global = true)]
    pub lexicon: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch current rates for a source.
    ///
    /// # Examples
    ///
    ///   fintec rates bcv
    ///   fintec rates binance --offline
    Rates(SourceArgs),

    /// List stored rate history, oldest first.
    History(HistoryArgs),

    /// Show rate trends for a source.
    Trends(SourceArgs),

    /// Compare the BCV rate with the Binance P2P midpoint.
    Compare,

    /// Convert an amount between currencies through USD.
    ///
    /// # Examples
    ///
    ///   fintec convert 100 USD VES
    ///   fintec convert 2500 VES EUR
    Convert(ConvertArgs),

    /// Format an amount given in minor units.
    Format(FormatArgs),

    /// Split an amount by ratios; the parts always sum to the total.
    ///
    /// # Examples
    ///
    ///   fintec allocate 10000 USD 1 1 1
    Allocate(AllocateArgs),

    /// Detect the intention behind a chat message.
    Intent(MessageArgs),

    /// Classify a reply to a confirmation prompt.
    Reply(MessageArgs),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rates(_) => "rates",
            Self::History(_) => "history",
            Self::Trends(_) => "trends",
            Self::Compare => "compare",
            Self::Convert(_) => "convert",
            Self::Format(_) => "format",
            Self::Allocate(_) => "allocate",
            Self::Intent(_) => "intent",
            Self::Reply(_) => "reply",
        }
    }

    /// Whether the command reads exchange rates.
    pub const fn uses_rates(&self) -> bool {
        match self {
            Self::Rates(_)
            | Self::History(_)
            | Self::Trends(_)
            | Self::Compare
            | Self::Convert(_) => true,
            Self::Format(args) => args.usd_equivalent,
            Self::Allocate(_) | Self::Intent(_) | Self::Reply(_) => false,
        }
    }
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Rate source: bcv or binance.
    pub source: RateSource,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Rate source: bcv or binance.
    pub source: RateSource,

    /// Days back from today (Caracas time).
    #[arg(long, default_value_t = 30)]
    pub days: u32,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Amount in major units.
    #[arg(allow_negative_numbers = true)]
    pub amount: f64,

    /// Source currency code.
    pub from: String,

    /// Target currency code.
    pub to: String,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Amount in minor units (cents).
    #[arg(allow_negative_numbers = true)]
    pub amount_minor: i64,

    /// Currency code.
    pub code: String,

    /// Append the dollar equivalent at the BCV rate (VES only).
    #[arg(long, default_value_t = false)]
    pub usd_equivalent: bool,

    /// Locale such as es-VE or en-US.
    #[arg(long)]
    pub locale: Option<String>,

    /// Append the ISO code.
    #[arg(long, default_value_t = false)]
    pub code_suffix: bool,
}

#[derive(Debug, Args)]
pub struct AllocateArgs {
    /// Amount in minor units (cents).
    #[arg(allow_negative_numbers = true)]
    pub amount_minor: i64,

    /// Currency code.
    pub code: String,

    /// Relative weights of each part.
    #[arg(required = true, num_args = 1..)]
    pub ratios: Vec<f64>,
}

#[derive(Debug, Args)]
pub struct MessageArgs {
    /// The user's message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rate_commands() {
        let cli = Cli::try_parse_from(["fintec", "history", "BCV", "--days", "7", "--pretty"])
            .expect("valid arguments");

        assert!(cli.pretty);
        match cli.command {
            Command::History(args) => {
                assert_eq!(args.source, RateSource::Bcv);
                assert_eq!(args.days, 7);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sources() {
        assert!(Cli::try_parse_from(["fintec", "rates", "paralelo"]).is_err());
    }

    #[test]
    fn allocate_needs_at_least_one_ratio() {
        assert!(Cli::try_parse_from(["fintec", "allocate", "100", "USD"]).is_err());

        let cli = Cli::try_parse_from(["fintec", "allocate", "100", "USD", "1", "2"])
            .expect("valid arguments");
        assert_eq!(cli.command.name(), "allocate");
    }

    #[test]
    fn only_rate_backed_commands_need_rate_services() {
        let needs = |args: &[&str]| {
            Cli::try_parse_from(args.iter().copied())
                .expect("valid arguments")
                .command
                .uses_rates()
        };

        assert!(needs(&["fintec", "compare"]));
        assert!(needs(&["fintec", "format", "150000", "VES", "--usd-equivalent"]));
        assert!(!needs(&["fintec", "format", "150000", "VES"]));
        assert!(!needs(&["fintec", "intent", "transferir 200 euros"]));
    }

    #[test]
    fn negative_amounts_are_values_not_flags() {
        let cli = Cli::try_parse_from(["fintec", "format", "-1500", "USD"]).expect("valid");

        match cli.command {
            Command::Format(args) => assert_eq!(args.amount_minor, -1500),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
