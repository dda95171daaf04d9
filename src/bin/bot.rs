use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use futures_trend_bot::broker::paper::{PaperBroker, SyntheticStrip};
use futures_trend_bot::broker::Broker;
use futures_trend_bot::execution::ExecutionDriver;
use futures_trend_bot::simulation::{business_days, simulate};
use futures_trend_bot::strategy::TrendFollowSignal;
use futures_trend_bot::BotConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "bot", about = "Trend-following futures signal on a paper account")]
struct Args {
    /// JSON config file; defaults apply when omitted.
    #[arg(long, env = "TREND_BOT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Seed for the synthetic paper market.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Evaluate the signal on every business day of a range.
    Simulate {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Reconcile the paper position with the signal.
    Execute {
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Run the reconciliation this many times in a row.
        #[arg(long, default_value_t = 1)]
        runs: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

fn paper_market(cfg: &BotConfig, first: NaiveDate, last: NaiveDate, seed: u64) -> PaperBroker {
    let strip = SyntheticStrip::covering(
        first,
        last,
        cfg.signal.lookback_days,
        cfg.signal.nth_contract,
        cfg.signal.min_days_to_expiry,
    );
    PaperBroker::synthetic_strip(&cfg.signal.template, &strip, seed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let cfg = match &args.config {
        Some(path) => BotConfig::from_json_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => BotConfig::default(),
    };

    match args.cmd {
        Cmd::Simulate { start, end, format } => {
            let broker: Arc<dyn Broker> = Arc::new(paper_market(&cfg, start, end, args.seed));
            let signal = TrendFollowSignal::new(broker, cfg.signal.clone());
            let table = simulate(&signal, business_days(start, end)).await?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
                Format::Csv => print!("{}", table.to_csv()),
            }
        }
        Cmd::Execute { date, runs } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let broker: Arc<dyn Broker> = Arc::new(paper_market(&cfg, date, date, args.seed));
            let signal = TrendFollowSignal::new(broker.clone(), cfg.signal.clone());
            let driver = ExecutionDriver::new(broker, signal, cfg.execution.clone());
            for _ in 0..runs {
                let report = driver.rebalance(date).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }
    Ok(())
}
