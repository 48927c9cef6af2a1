//! Command-line interface for equity-digest
//!
//! # Usage
//!
//! ```bash
//! # Keys for any of the supported providers, in fallback order
//! export GOOGLE_API_KEY="..."
//! export GROQ_API_KEY="..."
//!
//! equity-digest digest AAPL MSFT -i "Focus on dividends"
//! equity-digest validate AAPL NOPE
//! equity-digest chat "stock_daily_digest AAPL TSLA"
//! ```

use agent_equity::{
    Application, DigestCommand, DigestConfig, EquityError, Outcome, YahooTickerValidator,
    partition_tickers, render_outcome,
};
use agent_utils::LogFormat;
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "equity-digest", version)]
#[command(about = "Investment research digests from a fallback chain of LLM providers", long_about = None)]
struct Cli {
    /// JSON configuration file; provider keys are read from the environment otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize one or more tickers
    Digest {
        /// Ticker symbols, e.g. AAPL MSFT
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Extra instruction sent with every ticker (repeatable)
        #[arg(short = 'i', long = "instruction")]
        instructions: Vec<String>,

        /// Do not check symbols against Yahoo Finance
        #[arg(long)]
        skip_validation: bool,

        /// Run each ticker separately so one failure does not hide the others
        #[arg(long)]
        per_ticker: bool,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Print failures as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check ticker symbols against Yahoo Finance
    Validate {
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// Handle a chat message the way the digest bot would
    Chat {
        /// Message text; read from stdin when omitted
        message: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DigestConfig, EquityError> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            DigestConfig::from_file(path)
        }
        None => DigestConfig::from_env(),
    }
}

async fn with_deadline<F, T>(timeout: Option<u64>, fut: F) -> Result<T, EquityError>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(secs) => {
            let limit = Duration::from_secs(secs);
            tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| EquityError::Timeout(limit))
        }
        None => Ok(fut.await),
    }
}

fn format_outcome(outcome: &Outcome<String>, json: bool) -> anyhow::Result<String> {
    Ok(match outcome {
        Err(error) if json => serde_json::to_string_pretty(error)?,
        _ => render_outcome(outcome),
    })
}

/// One `**TICKER**` section per result; the flag is set if any ticker failed
fn per_ticker_report(
    results: &[(String, Outcome<String>)],
    json: bool,
) -> anyhow::Result<(String, bool)> {
    let mut sections = Vec::with_capacity(results.len());
    for (ticker, outcome) in results {
        sections.push(format!("**{ticker}**\n{}", format_outcome(outcome, json)?));
    }
    let failed = results.iter().any(|(_, outcome)| outcome.is_err());
    Ok((sections.join("\n"), failed))
}

async fn run_digest(
    config: DigestConfig,
    tickers: Vec<String>,
    instructions: Vec<String>,
    skip_validation: bool,
    per_ticker: bool,
    timeout: Option<u64>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let tickers = if skip_validation {
        agent_equity::validator::normalize_tickers(&tickers)
    } else {
        let validator = YahooTickerValidator::new()?;
        let partition = partition_tickers(&validator, &tickers).await;
        if !partition.invalid.is_empty() {
            warn!("Ignoring invalid symbols: {}", partition.invalid.join(", "));
        }
        partition.valid
    };

    if tickers.is_empty() {
        eprintln!("{}", agent_equity::command::usage(&config.trigger));
        return Ok(ExitCode::FAILURE);
    }

    let app = Application::from_config(config)?;
    info!("Backends: {}", app.backend_names().join(", "));

    let failed = if per_ticker {
        let results =
            with_deadline(timeout, app.summarize_each(tickers.as_slice(), &instructions)).await?;
        let (report, failed) = per_ticker_report(&results, json)?;
        println!("{report}");
        failed
    } else {
        let outcome = with_deadline(timeout, app.summarize(tickers.as_slice(), &instructions)).await?;
        println!("{}", format_outcome(&outcome, json)?);
        outcome.is_err()
    };

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_validate(tickers: Vec<String>) -> anyhow::Result<ExitCode> {
    let validator = YahooTickerValidator::new()?;
    let partition = partition_tickers(&validator, &tickers).await;

    for ticker in &partition.valid {
        println!("{ticker}\tvalid");
    }
    for ticker in &partition.invalid {
        println!("{ticker}\tinvalid");
    }

    Ok(if partition.invalid.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_chat(config: DigestConfig, message: Option<String>) -> anyhow::Result<ExitCode> {
    let message = match message {
        Some(message) => message,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let Some(command) = DigestCommand::parse(&message, &config.trigger) else {
        eprintln!("Not a digest command; start the message with '{}'", config.trigger);
        return Ok(ExitCode::FAILURE);
    };

    let app = Application::from_config(config)?;
    let validator = YahooTickerValidator::new()?;

    for reply in command.respond(&app, &validator).await {
        println!("{reply}\n");
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    agent_utils::load_dotenv();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    agent_utils::init_tracing_with(format, "warn,agent_equity=info,agent_core=info");

    match cli.command {
        Commands::Digest {
            tickers,
            instructions,
            skip_validation,
            per_ticker,
            timeout,
            json,
        } => {
            let config = load_config(cli.config.as_ref())?;
            run_digest(
                config,
                tickers,
                instructions,
                skip_validation,
                per_ticker,
                timeout,
                json,
            )
            .await
        }
        Commands::Validate { tickers } => run_validate(tickers).await,
        Commands::Chat { message } => {
            let config = load_config(cli.config.as_ref())?;
            run_chat(config, message).await
        }
    }
}
