//! SalesDesk CLI — wholesaler rankings, client lookups, holdings summaries,
//! and cache management.
//!
//! Commands:
//! - `rank` — wholesaler ranking for a channel and reporting period
//! - `clients ticker` / `clients uit` — detail-row grids
//! - `summary` — generate the holdings summary text from uploaded exports
//! - `cache status` / `cache clean` — inspect or prune the table cache

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use salesdesk_core::auth;
use salesdesk_core::config::AppConfig;
use salesdesk_core::data::source::FileSource;
use salesdesk_core::data::TableLoader;
use salesdesk_core::report::{holdings_summary, with_currency_display};
use salesdesk_core::session::{RankingRequest, Session, WholesalerChannel};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "salesdesk",
    about = "SalesDesk CLI — sales intelligence reporting"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "salesdesk.toml")]
    config: PathBuf,

    /// Verified analyst email; must belong to the configured domain.
    #[arg(long = "as-user", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank wholesalers by summed AUM for one channel and period.
    Rank {
        /// Wholesaler channel to rank.
        #[arg(long, value_enum)]
        channel: Channel,

        /// Reporting period (MM-YYYY).
        #[arg(long)]
        date: String,

        /// Restrict to one internal wholesaler.
        #[arg(long)]
        vest_wholesaler: Option<String>,

        /// Spread tickers into result columns.
        #[arg(long, default_value_t = false)]
        split_by_ticker: bool,
    },
    /// Client detail grids.
    Clients {
        #[command(subcommand)]
        grid: ClientGrid,
    },
    /// Generate the holdings summary text from two uploaded exports.
    Summary {
        /// Ticker list (needs a 'Ticker' column).
        #[arg(long)]
        tickers: PathBuf,

        /// Shareholder-filing export.
        #[arg(long)]
        filing: PathBuf,

        /// Banner rows above the filing export's header.
        #[arg(long, default_value_t = 3)]
        skip_rows: usize,

        /// Write the summary here instead of printing it.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Channel {
    Structured,
    Etf,
    Uit,
}

impl From<Channel> for WholesalerChannel {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Structured => WholesalerChannel::Structured,
            Channel::Etf => WholesalerChannel::Etf,
            Channel::Uit => WholesalerChannel::Uit,
        }
    }
}

#[derive(Subcommand)]
enum ClientGrid {
    /// Top clients holding one ETF ticker.
    Ticker {
        /// Reporting period (MM-YYYY).
        #[arg(long)]
        date: String,

        /// Ticker to analyze.
        #[arg(long)]
        ticker: String,

        /// Restrict to one external wholesaler.
        #[arg(long)]
        wholesaler: Option<String>,
    },
    /// Every UIT client row for one period.
    Uit {
        /// Reporting period (MM-YYYY).
        #[arg(long)]
        date: String,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached sources, row counts, and fetch times.
    Status,
    /// Remove entries older than the configured TTL.
    Clean,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = AppConfig::from_toml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Rank {
            channel,
            date,
            vest_wholesaler,
            split_by_ticker,
        } => {
            authorize(&cli.user, &config)?;
            let session = open_session(&config)?;
            let ranked = session.wholesaler_ranking(&RankingRequest {
                channel: channel.into(),
                date,
                vest_wholesaler,
                split_by_ticker,
            })?;
            println!("{}", with_currency_display(ranked));
        }
        Commands::Clients { grid } => {
            authorize(&cli.user, &config)?;
            let session = open_session(&config)?;
            let result = match grid {
                ClientGrid::Ticker {
                    date,
                    ticker,
                    wholesaler: Some(wholesaler),
                } => session.clients_by_ticker_and_wholesaler(&date, &ticker, &wholesaler)?,
                ClientGrid::Ticker {
                    date,
                    ticker,
                    wholesaler: None,
                } => session.clients_by_ticker(&date, &ticker)?,
                ClientGrid::Uit { date } => session.uit_clients(&date)?,
            };
            println!("{}", with_currency_display(result));
        }
        Commands::Summary {
            tickers,
            filing,
            skip_rows,
            out,
        } => {
            authorize(&cli.user, &config)?;
            let loader = loader_from(&config);
            let ticker_table = loader.load(&FileSource::new(&tickers))?;
            let filing_table =
                loader.load(&FileSource::new(&filing).with_skip_rows(skip_rows))?;
            let text = holdings_summary(&ticker_table, &filing_table)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {} lines to {}", text.lines().count(), path.display());
                }
                None => println!("{text}"),
            }
        }
        Commands::Cache { action } => {
            let loader = loader_from(&config);
            match action {
                CacheAction::Status => {
                    let statuses = loader.cache().status();
                    if statuses.is_empty() {
                        println!("Cache is empty.");
                    }
                    for status in statuses {
                        println!(
                            "{}  rows={}  cached_at={}",
                            status.source_id, status.row_count, status.cached_at
                        );
                    }
                }
                CacheAction::Clean => {
                    let removed = loader.cache().clean_stale(loader.ttl());
                    println!("Removed {removed} stale cache entries.");
                }
            }
        }
    }
    Ok(())
}

fn authorize(user: &Option<String>, config: &AppConfig) -> Result<()> {
    let Some(email) = user else {
        bail!("--as-user is required: pass the verified analyst email");
    };
    auth::authorize(email, &config.auth.allowed_domain)?;
    Ok(())
}

fn loader_from(config: &AppConfig) -> TableLoader {
    TableLoader::new(&config.cache.dir, config.cache.ttl_days)
}

fn open_session(config: &AppConfig) -> Result<Session> {
    let loader = loader_from(config);
    Session::open(config, &loader).context("building session tables")
}
