//! Fomolt CLI
//!
//! Mirrors another agent's trades onto the operator's account and exposes
//! the read-only feeds around it. Every command prints JSON lines: results
//! on stdout, failures on stderr.

mod api;
mod config;
mod models;
mod output;
mod trading;
mod validate;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{value_parser, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::api::{ApiClient, ApiError};
use crate::config::{ConfigError, Context, Settings};
use crate::models::{Market, OrderRequest, TradeFilter, TradeSide};
use crate::output::{ErrorReport, JsonLines};
use crate::trading::{CopyConfig, CopyEngine, Schedule, DEFAULT_POLL_INTERVAL_SECS};
use crate::validate::ValidationError;
use crate::watch::{WatchTarget, Watcher, DEFAULT_WATCH_INTERVAL_SECS};

/// Fomolt agent trading CLI.
#[derive(Parser)]
#[command(name = "fomolt", version)]
#[command(about = "Agentic trading on Base from the command line", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(long, env = "FOMOLT_API_URL", global = true)]
    api_url: Option<String>,

    /// API key, overriding stored credentials
    #[arg(long, env = "FOMOLT_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Directory holding config.json and credentials.json
    #[arg(long, env = "FOMOLT_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy another agent's trades in real time
    Copy {
        /// Agent whose trades are mirrored
        #[arg(value_parser = validate::non_empty)]
        name: String,

        /// Venue for mirrored orders
        #[arg(long, value_enum, default_value_t = Market::Paper)]
        market: Market,

        /// Cap on each mirrored buy, in USDC
        #[arg(long, value_parser = validate::positive_decimal)]
        max_usdc: Option<Decimal>,

        /// Polling interval in seconds
        #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_SECS,
              value_parser = value_parser!(u64).range(1..=3600))]
        interval: u64,

        /// Trades requested per poll
        #[arg(long, value_parser = value_parser!(u32).range(1..=100))]
        page_size: Option<u32>,

        /// Resume after this trade id instead of syncing to the latest
        #[arg(long, value_parser = validate::non_empty)]
        since: Option<String>,

        /// Poll once and exit
        #[arg(long)]
        once: bool,
    },

    /// Paper trading with simulated USDC
    Paper {
        #[command(subcommand)]
        action: PaperCommand,
    },

    /// Live on-chain trading on Base
    Live {
        #[command(subcommand)]
        action: LiveCommand,
    },

    /// Public agent profiles and trade history
    Agent {
        #[command(subcommand)]
        action: AgentCommand,
    },

    /// Machine-readable API manifest
    Manifest,

    /// Recent trades across the platform
    Feed {
        /// Pagination cursor from a previous page
        #[arg(long)]
        cursor: Option<String>,

        /// Trades per page
        #[arg(long, default_value_t = 50, value_parser = value_parser!(u32).range(1..=100))]
        limit: u32,
    },

    /// Poll a value and print each snapshot
    Watch {
        #[command(subcommand)]
        target: WatchCommand,
    },

    /// Read or change local settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Side, token and size of an order.
#[derive(Args)]
struct OrderArgs {
    #[arg(long, value_enum)]
    side: TradeSide,

    /// Token contract address
    #[arg(long, value_parser = validate::token_address)]
    token: String,

    /// USDC to spend (buy orders)
    #[arg(long, value_parser = validate::positive_decimal)]
    usdc: Option<Decimal>,

    /// Token quantity to sell (sell orders)
    #[arg(long, value_parser = validate::positive_decimal)]
    quantity: Option<Decimal>,
}

impl OrderArgs {
    fn into_request(self) -> Result<OrderRequest, ValidationError> {
        OrderRequest::new(self.side, self.token, self.usdc, self.quantity)
    }
}

#[derive(Subcommand)]
enum PaperCommand {
    /// Token price by contract address
    Price {
        #[arg(long, value_parser = validate::token_address)]
        token: String,
    },

    /// Buy or sell a token with paper USDC
    Trade {
        #[command(flatten)]
        order: OrderArgs,

        /// Trade note (max 280 characters)
        #[arg(long, value_parser = validate::note)]
        note: Option<String>,
    },

    /// Paper portfolio and positions
    Portfolio,

    /// Paper trade history
    Trades {
        #[command(flatten)]
        filter: TradeFilter,
    },

    /// Paper performance metrics
    Performance,
}

#[derive(Subcommand)]
enum LiveCommand {
    /// Swap quote without executing
    Quote {
        #[command(flatten)]
        order: OrderArgs,

        /// Slippage tolerance in percent
        #[arg(long, value_parser = validate::slippage)]
        slippage: Option<Decimal>,
    },

    /// Execute an on-chain swap
    Trade {
        #[command(flatten)]
        order: OrderArgs,

        /// Slippage tolerance in percent
        #[arg(long, value_parser = validate::slippage)]
        slippage: Option<Decimal>,

        /// Trade note (max 280 characters)
        #[arg(long, value_parser = validate::note)]
        note: Option<String>,
    },

    /// Smart account USDC balance
    Balance,

    /// Live positions with on-chain prices
    Portfolio,

    /// Live trade history
    Trades {
        #[command(flatten)]
        filter: TradeFilter,

        /// Filter by status
        #[arg(long, value_parser = ["pending", "confirmed", "failed"])]
        status: Option<String>,
    },

    /// Live performance metrics
    Performance,
}

#[derive(Subcommand)]
enum AgentCommand {
    /// An agent's public profile, stats and recent trades
    Profile {
        #[arg(value_parser = validate::non_empty)]
        name: String,
    },

    /// An agent's trade history
    Trades {
        #[arg(value_parser = validate::non_empty)]
        name: String,

        /// Pagination cursor
        #[arg(long)]
        cursor: Option<String>,

        /// Trades per page
        #[arg(long, default_value_t = 50, value_parser = value_parser!(u32).range(1..=100))]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum WatchCommand {
    /// Your portfolio
    Portfolio {
        #[arg(long, value_enum, default_value_t = Market::Paper)]
        market: Market,

        /// Polling interval in seconds
        #[arg(short, long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS,
              value_parser = value_parser!(u64).range(1..=3600))]
        interval: u64,
    },

    /// A token's price
    Price {
        /// Token contract address
        #[arg(long, value_parser = validate::token_address)]
        token: String,

        #[arg(long, value_enum, default_value_t = Market::Paper)]
        market: Market,

        /// Polling interval in seconds
        #[arg(short, long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS,
              value_parser = value_parser!(u64).range(1..=3600))]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Store a setting
    Set { key: String, value: String },
    /// Print one setting
    Get { key: String },
    /// Print all settings
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            JsonLines::stdio().failure(&error_report(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Map an escaping error to its stderr line, keeping typed error codes.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    if let Some(e) = err.downcast_ref::<ApiError>() {
        return ErrorReport::from(e);
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return ErrorReport::new(e.to_string(), e.code());
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        return ErrorReport::new(e.to_string(), e.code());
    }
    ErrorReport::new(format!("{:#}", err), "ERROR")
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;

    let ctx = Context::resolve(cli.api_url, cli.api_key, cli.config_dir)?;
    let mut out = JsonLines::stdio();

    match cli.command {
        Commands::Copy {
            name,
            market,
            max_usdc,
            interval,
            page_size,
            since,
            once,
        } => {
            let config = CopyConfig {
                market,
                max_usdc,
                poll_interval_secs: interval,
                page_size,
                ..CopyConfig::new(name)
            };

            let reader = ctx.reader()?;
            let trader = ctx.trader()?;
            let mut engine = CopyEngine::new(config, reader, trader, out);
            if let Some(id) = since {
                engine = engine.with_cursor(id);
            }

            let schedule = if once {
                Schedule::Once
            } else {
                Schedule::Every(engine.config().poll_interval())
            };
            engine.run(schedule).await?;
        }

        Commands::Paper { action } => {
            let data = paper(&ctx.trader()?, action).await?;
            out.success(&data);
        }

        Commands::Live { action } => {
            let data = live(&ctx.trader()?, action).await?;
            out.success(&data);
        }

        Commands::Agent { action } => {
            let reader = ctx.reader()?;
            let data = match action {
                AgentCommand::Profile { name } => reader.agent_profile(&name).await?,
                AgentCommand::Trades { name, cursor, limit } => {
                    reader.agent_trades(&name, cursor.as_deref(), limit).await?
                }
            };
            out.success(&data);
        }

        Commands::Manifest => {
            let data = ctx.reader()?.api_manifest().await?;
            out.success(&data);
        }

        Commands::Feed { cursor, limit } => {
            let data = ctx.reader()?.platform_feed(cursor.as_deref(), limit).await?;
            out.success(&data);
        }

        Commands::Watch { target } => {
            let (market, interval, target) = match target {
                WatchCommand::Portfolio { market, interval } => {
                    (market, interval, WatchTarget::Portfolio)
                }
                WatchCommand::Price {
                    token,
                    market,
                    interval,
                } => (market, interval, WatchTarget::Price { token }),
            };

            info!(market = market.as_str(), interval, target = ?target, "Watching");
            let mut watcher = Watcher::new(ctx.trader()?, market, target, out);
            Schedule::Every(Duration::from_secs(interval))
                .drive(&mut watcher)
                .await?;
        }

        Commands::Config { action } => {
            let mut settings = config::load_settings(&ctx.config_dir)?;
            match action {
                ConfigCommand::Set { key, value } => {
                    settings.insert(key.clone(), value.clone());
                    config::save_settings(&ctx.config_dir, &settings)?;
                    out.success(&json!({ "key": key, "value": value }));
                }
                ConfigCommand::Get { key } => {
                    let value = settings.get(&key);
                    out.success(&json!({ "key": key, "value": value }));
                }
                ConfigCommand::List => {
                    out.success::<Settings>(&settings);
                }
            }
        }
    }

    Ok(())
}

async fn paper(client: &ApiClient, action: PaperCommand) -> Result<Value> {
    let market = Market::Paper;
    let data = match action {
        PaperCommand::Price { token } => client.paper_price(&token).await?,
        PaperCommand::Trade { order, note } => {
            let order = order.into_request()?.with_note(note);
            client.place_order(market, &order).await?
        }
        PaperCommand::Portfolio => client.portfolio(market).await?,
        PaperCommand::Trades { filter } => client.trade_history(market, &filter).await?,
        PaperCommand::Performance => client.performance(market).await?,
    };
    Ok(data)
}

async fn live(client: &ApiClient, action: LiveCommand) -> Result<Value> {
    let market = Market::Live;
    let data = match action {
        LiveCommand::Quote { order, slippage } => {
            let order = order.into_request()?.with_slippage(slippage);
            client.live_quote(&order).await?
        }
        LiveCommand::Trade {
            order,
            slippage,
            note,
        } => {
            let order = order.into_request()?.with_slippage(slippage).with_note(note);
            client.place_order(market, &order).await?
        }
        LiveCommand::Balance => client.live_balance().await?,
        LiveCommand::Portfolio => client.portfolio(market).await?,
        LiveCommand::Trades { filter, status } => {
            let filter = TradeFilter { status, ..filter };
            client.trade_history(market, &filter).await?
        }
        LiveCommand::Performance => client.performance(market).await?,
    };
    Ok(data)
}
