use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use fundgain::core::Investment;
use fundgain::core::log::init_logging;
use std::path::PathBuf;

const CLI_DATE_FORMAT: &str = "%d/%m/%Y";

/// Finds which portfolio of funds would have earned the most between two dates
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Start of the holding period (DD/MM/YYYY)
    #[arg(value_parser = parse_cli_date, default_value = "06/04/2023")]
    start_date: NaiveDate,

    /// End of the holding period (DD/MM/YYYY)
    #[arg(value_parser = parse_cli_date, default_value = "06/04/2024")]
    end_date: NaiveDate,

    /// Amount invested at the start date
    #[arg(default_value_t = 100_000)]
    initial_amount: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// JSON file listing the portfolios to compare
    #[arg(short, long, default_value = "portfolios.json")]
    portfolios: PathBuf,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, CLI_DATE_FORMAT)
        .map_err(|e| format!("expected a date as DD/MM/YYYY: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let investment = Investment {
        start_date: cli.start_date,
        end_date: cli.end_date,
        initial_amount: cli.initial_amount as f64,
    };

    let result = fundgain::run(cli.config_path.as_deref(), &cli.portfolios, &investment).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["fundgain"]);
        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2023, 4, 6).unwrap());
        assert_eq!(cli.end_date, NaiveDate::from_ymd_opt(2024, 4, 6).unwrap());
        assert_eq!(cli.initial_amount, 100_000);
        assert_eq!(cli.portfolios, PathBuf::from("portfolios.json"));
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::parse_from(["fundgain", "01/02/2022", "31/12/2022", "5000"]);
        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2022, 2, 1).unwrap());
        assert_eq!(cli.end_date, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(cli.initial_amount, 5000);
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        assert!(Cli::try_parse_from(["fundgain", "2023-04-06"]).is_err());
        assert!(Cli::try_parse_from(["fundgain", "31/02/2023"]).is_err());
        assert!(Cli::try_parse_from(["fundgain", "06/04/2023", "06/04/2024", "lots"]).is_err());
    }
}
