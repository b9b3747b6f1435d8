use anyhow::Result;
use clap::{Parser, Subcommand};
use corpus_acquire::{ted, wikipedia, ApiClient, RetryPolicy, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "corpus")]
#[command(about = "Fetch multilingual talk transcripts and encyclopedia articles into a local cache")]
#[command(version)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Root of the content cache
    #[arg(long, global = true, default_value = "cached")]
    cache_dir: PathBuf,

    /// Attempts per request before a transient failure becomes terminal
    #[arg(long, global = true, default_value_t = 5)]
    max_attempts: u32,

    /// Seconds before a single request is abandoned and retried
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a talk's transcript in every supported locale (clears the talk's cache first)
    Transcripts {
        /// Talk identifier
        #[arg(long, default_value_t = ted::DEFAULT_TALK_ID)]
        talk_id: u32,
    },

    /// Fetch articles in every language they exist in, skipping files already cached
    Encyclopedia {
        /// Canonical (English) article title; repeat for several. Defaults to the built-in list
        #[arg(short, long = "title", value_parser = parse_title)]
        titles: Vec<String>,
    },

    /// Validate a cached JSON file (transcript, article bundle, or language-link manifest)
    Validate {
        /// Path to the file to validate
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the HTTP stack quiet at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug,hyper_util=info,rustls=info",
        LogLevel::Trace => "trace,hyper_util=info,rustls=info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    let retry = RetryPolicy {
        max_attempts: cli.max_attempts.max(1),
        ..RetryPolicy::default()
    };
    let client = ApiClient::with_timeout(retry, Duration::from_secs(cli.timeout_secs.max(1)))?;

    let report = match cli.command {
        Commands::Transcripts { talk_id } => {
            let config = ted::TranscriptConfig::new(cli.cache_dir.join("ted-talks"), talk_id)?;
            ted::acquire(&config, &client).await?
        }
        Commands::Encyclopedia { titles } => {
            let mut config = wikipedia::EncyclopediaConfig::new(cli.cache_dir.join("wikipedia"))?;
            if !titles.is_empty() {
                config.titles = titles;
            }
            wikipedia::acquire(&config, &client).await?
        }
        Commands::Validate { file } => {
            tracing::info!(file = %file, "Validating");
            corpus_validate::validate(&file)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(exit_code(&report))
}

fn parse_title(title: &str) -> Result<String> {
    wikipedia::check_title(title)?;
    Ok(title.to_string())
}

fn exit_code(report: &RunReport) -> ExitCode {
    report.log_summary();
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
