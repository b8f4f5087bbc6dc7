//! spotify-token
//!
//! Command-line front end for the Spotify authorization flows:
//! 1. Loads config (TOML file + SPOTIFY_* environment)
//! 2. Builds the configured flow with a shared HTTP client
//! 3. Prints a usable access token, refreshing or authorizing as needed
//!
//! Logs go to stderr so stdout carries only the token.

mod config;

use anyhow::{Context, Result, bail};
use spotify_auth::{AuthFlow, StdinPrompt};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "usage: spotify-token [--config PATH] [token|header|clear]";

/// What to do once the flow is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print the access token.
    Token,
    /// Print an `Authorization: Bearer ...` header line.
    Header,
    /// Delete the token cache.
    Clear,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<String>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut command = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                config = Some(path.clone());
            }
            "token" | "header" | "clear" if command.is_none() => {
                command = Some(match arg.as_str() {
                    "header" => Command::Header,
                    "clear" => Command::Clear,
                    _ => Command::Token,
                });
            }
            other => bail!("unexpected argument {other:?}\n{USAGE}"),
        }
    }
    Ok(Args {
        config,
        command: command.unwrap_or(Command::Token),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = common::non_empty_var("LOG_FORMAT").is_some_and(|f| f == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    let config_path = Config::resolve_path(args.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let mut flow = AuthFlow::new(config.client.flow, &config.flow_options(), http, StdinPrompt)
        .context("failed to configure authorization flow")?;
    info!(
        flow = flow.kind().label(),
        cache_path = %flow.config().cache_path().display(),
        scope = %flow.config().scope(),
        "flow ready"
    );

    let outcome = run(&mut flow, args.command).await;
    flow.close();
    outcome
}

async fn run(flow: &mut AuthFlow, command: Command) -> Result<()> {
    match command {
        Command::Token => {
            let token = flow.get_token().await.context("failed to obtain access token")?;
            println!("{token}");
        }
        Command::Header => {
            let header = flow.bearer_header().await.context("failed to obtain access token")?;
            let value = header.to_str().context("bearer header is not printable")?;
            println!("Authorization: {value}");
        }
        Command::Clear => {
            flow.clear_cache().await;
            info!("token cache cleared");
        }
    }
    Ok(())
}
