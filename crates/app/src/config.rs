use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use engine::{TransactionType, YearMonth};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/ledgerbook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// IANA zone deciding which calendar day is "today".
    pub timezone: String,
    pub level: String,
    pub currency_symbol: String,
    /// Payment method preselected on new entries, matched by name.
    pub default_payment_method: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/".to_string(),
            timezone: "UTC".to_string(),
            level: "info".to_string(),
            currency_symbol: "৳".to_string(),
            default_payment_method: "cash".to_string(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ledgerbook", version, about = "Ledger reports from the command line")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override base URL of the ledger service.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long, global = true)]
    timezone: Option<String>,
    /// Override log level.
    #[arg(long, global = true)]
    level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a filtered report, or export it as a CSV statement.
    Report(ReportArgs),
    /// Today's credits and debits.
    Today,
    /// Monthly analytics.
    Dashboard {
        /// Month as YYYY-MM; defaults to the current one.
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Record a transaction dated today.
    Add(AddArgs),
    /// List account heads.
    Categories {
        #[arg(long = "type")]
        kind: Option<TransactionType>,
    },
    /// List payment methods.
    PaymentMethods,
}

#[derive(Debug, ClapArgs)]
pub struct ReportArgs {
    /// First day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long = "type")]
    pub kind: Option<TransactionType>,
    /// Account head id or name. Needs --type.
    #[arg(long)]
    pub category: Option<String>,
    /// Payment method id or name.
    #[arg(long)]
    pub payment_method: Option<String>,
    /// Text searched in remarks.
    #[arg(long)]
    pub search: Option<String>,
    /// Also show the balance carried in from before --from.
    #[arg(long)]
    pub include_opening: bool,
    /// Write a CSV statement to this path instead of printing.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
pub struct AddArgs {
    #[arg(long = "type")]
    pub kind: TransactionType,
    /// Account head id or name.
    #[arg(long)]
    pub category: String,
    /// Amount such as 12.50 or 12,5.
    #[arg(long)]
    pub amount: String,
    /// Payment method id or name; defaults to the configured one.
    #[arg(long)]
    pub payment_method: Option<String>,
    #[arg(long, default_value = "")]
    pub remarks: String,
}

pub fn load() -> Result<(AppConfig, Command)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("LEDGERBOOK"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.command))
}
