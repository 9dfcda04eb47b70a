//! Command-line client for the rule based engine
//!
//! Starts one engine process and feeds it token lines, either from
//! `--tokens` or one request per line of stdin, printing one answer each.

use anyhow::{Context, Result};
use clap::Parser;
use rbe_interface::{ProcessLauncher, RbeConfig, TokenPolicy};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rbe-client", version, about = "Send token lines to the rule based engine")]
struct Cli {
    /// Rule database files, passed to the engine in order
    databases: Vec<String>,

    /// Engine executable (overrides config file and RBE_BINARY)
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Metric identifier
    #[arg(long, allow_hyphen_values = true)]
    metric: Option<String>,

    /// Direction identifier
    #[arg(long, allow_hyphen_values = true)]
    direction: Option<String>,

    /// Give up on a response after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// TOML config file, applied before environment variables and flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject tokens that contain whitespace instead of sending them verbatim
    #[arg(long)]
    strict: bool,

    /// Print each exchange as a JSON object
    #[arg(long)]
    json: bool,

    /// Send these tokens once instead of reading stdin (give it last)
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    tokens: Option<Vec<String>>,
}

impl Cli {
    fn load_config(&self) -> Result<RbeConfig> {
        let base = match &self.config {
            Some(path) => RbeConfig::from_toml_file(path)?,
            None => RbeConfig::default(),
        };
        let mut config = base.apply_env()?;

        if let Some(binary) = &self.binary {
            config.binary = binary.clone();
        }
        if let Some(metric) = &self.metric {
            config.metric = metric.clone();
        }
        if let Some(direction) = &self.direction {
            config.direction = direction.clone();
        }
        if !self.databases.is_empty() {
            config.database_files = self.databases.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.response_timeout = Some(Duration::from_millis(timeout_ms));
        }
        if self.strict {
            config.token_policy = TokenPolicy::Strict;
        }
        Ok(config.validated()?)
    }
}

fn print_exchange(json: bool, tokens: &[String], response: &str) {
    if json {
        println!("{}", json!({ "request": tokens, "response": response }));
    } else {
        println!("{}", response);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let launcher = ProcessLauncher::new(config)?;
    let mut session = launcher
        .launch()
        .await
        .with_context(|| format!("starting {:?}", launcher.command_line()))?;

    if let Some(tokens) = &cli.tokens {
        let response = session.optimize_tokens(tokens.as_slice()).await?;
        print_exchange(cli.json, tokens, &response);
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if tokens.is_empty() {
                continue;
            }
            let response = session.optimize_tokens(tokens.as_slice()).await?;
            print_exchange(cli.json, &tokens, &response);
        }
    }

    let status = session.close().await?;
    tracing::info!(%status, "Engine exited");
    Ok(())
}
