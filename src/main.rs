use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use verdict_dl::{Config, Error, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "verdict-dl")]
#[command(about = "Download the court verdicts published on a given date")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// JSON configuration file; omitted fields take their defaults
    #[arg(short, long, env = "VERDICT_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Publish date to download (YYYY-MM-DD, default: today)
    #[arg(short, long)]
    date: Option<chrono::NaiveDate>,

    /// Required document type
    #[arg(long)]
    document_type: Option<String>,

    /// Required importance value; parsed as JSON when possible (`0`, `"substantive"`), else taken as text
    #[arg(long)]
    importance: Option<String>,

    /// Root output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum attempts per HTTP request
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Keep verdict files that already exist instead of downloading them again
    #[arg(long)]
    skip_existing: bool,
}

impl Cli {
    fn into_config(self) -> verdict_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(date) = self.date {
            config.date = Some(date);
        }
        if let Some(document_type) = self.document_type {
            config.selection.document_type = document_type;
        }
        if let Some(importance) = self.importance {
            config.selection.importance = parse_importance(&importance);
        }
        if let Some(output_dir) = self.output_dir {
            config.output.output_dir = output_dir;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if self.skip_existing {
            config.output.skip_existing = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_importance(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Log to stderr and, without ANSI colors, to the run log file
fn init_logging(log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("verdict-dl: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_path = config.output.log_path();
    if let Err(e) = init_logging(&log_path) {
        eprintln!("verdict-dl: cannot open log file {}: {e}", log_path.display());
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "verdict-dl starting");

    let mut pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run().await {
        Ok(result) => {
            if result.is_complete() {
                tracing::info!(matched = result.matched, "all verdicts downloaded");
            } else {
                tracing::warn!(
                    failed = result.failed,
                    matched = result.matched,
                    "some verdicts could not be downloaded; see metadata for details"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e @ Error::Abort { .. }) => {
            tracing::error!(
                error = %e,
                status = ?e.search_status(),
                state = %pipeline.state(),
                "run aborted"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_parsing() {
        assert_eq!(parse_importance("0"), serde_json::json!(0));
        assert_eq!(parse_importance("\"substantive\""), serde_json::json!("substantive"));
        assert_eq!(parse_importance("substantive"), serde_json::json!("substantive"));
        assert_eq!(parse_importance("true"), serde_json::json!(true));
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "verdict-dl",
            "--date",
            "2025-10-01",
            "--document-type",
            "judgment",
            "--importance",
            "substantive",
            "--output-dir",
            "/tmp/verdicts",
            "--max-attempts",
            "4",
            "--skip-existing",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.date, chrono::NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(config.selection.document_type, "judgment");
        assert_eq!(config.selection.importance, serde_json::json!("substantive"));
        assert_eq!(config.output.output_dir, PathBuf::from("/tmp/verdicts"));
        assert_eq!(config.retry.max_attempts, 4);
        assert!(config.output.skip_existing);
    }

    #[test]
    fn cli_rejects_zero_attempts() {
        let cli = Cli::try_parse_from(["verdict-dl", "--max-attempts", "0"]).unwrap();
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["verdict-dl", "--date", "01/10/2025"]).is_err());
    }
}
