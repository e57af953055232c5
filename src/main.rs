use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use mastty::api::{FeedSource, MastodonClient};
use mastty::app::{App, AppEvent};
use mastty::config::{Config, ConfigError, EXAMPLE_CONFIG};
use mastty::tiles::{HttpImageSource, TileCache};

/// Environment variable that overrides `[auth] access_token`.
const TOKEN_ENV: &str = "MASTTY_ACCESS_TOKEN";

#[derive(Parser, Debug)]
#[command(name = "mastty", version, about = "Terminal client for Mastodon timelines")]
struct Args {
    /// Config file (default: ~/.config/mastty/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file (default: mastty.log next to the config file)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Do not subscribe to live updates; refresh with `r` instead
    #[arg(long)]
    no_stream: bool,
}

/// Send tracing output to `path`. The terminal belongs to the UI.
fn init_logging(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}

fn print_setup_help(path: &std::path::Path) {
    eprintln!("Error: No config file found at {}", path.display());
    eprintln!();
    eprintln!("To get started, create it with your server and an access token:");
    eprintln!();
    eprintln!("{}", EXAMPLE_CONFIG);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = Config::default_dir().context("Neither XDG_CONFIG_HOME nor HOME is set")?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| config_dir.join("mastty.log"));
    init_logging(&log_path)?;

    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::Missing(path)) => {
            print_setup_help(&path);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    config = config.with_token_override(std::env::var(TOKEN_ENV).ok());
    if args.no_stream {
        config.timeline.streaming = false;
    }
    config.validate().context("Invalid configuration")?;

    let token = config
        .auth
        .access_token
        .clone()
        .context("No access token configured")?;
    let client =
        MastodonClient::new(&config.auth.server, token).context("Failed to create API client")?;
    let server = client.server().clone();

    // Fail early on a bad token or unreachable server
    let me = match client.current_account().await {
        Ok(account) => account,
        Err(e) => {
            tracing::error!(error = %e, "Authentication failed");
            eprintln!("Error: could not sign in to {}: {}", server, e);
            std::process::exit(1);
        }
    };
    tracing::info!(account = %me.acct, server = %server, "Signed in");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let source: Arc<dyn FeedSource> = Arc::new(client);
    let mut app = App::new(source, server, &config);

    if config.images.enabled {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mastty/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create image HTTP client")?;
        let images = Arc::new(HttpImageSource::new(http, config.images.max_bytes));
        let tile_tx = event_tx.clone();
        let tiles = TileCache::new(
            images,
            config.images.max_tiles,
            Arc::new(move |source: &str| {
                let _ = tile_tx.send(AppEvent::TileReady(source.to_string()));
            }),
        );
        app = app.with_tiles(tiles);
    }

    mastty::ui::run(&mut app, event_tx, event_rx).await?;

    tracing::info!("Exiting");
    Ok(())
}
