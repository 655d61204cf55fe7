use anyhow::{Context, Result};
use clap::Parser;
use ogcard_rs::RewriteConfig;
use ogcard_serve::{app, AppState, DEFAULT_FETCH_TIMEOUT};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// ogcard-serve: HTTP service that resolves image conversion indirections and
/// normalizes card templates for rendering
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Address to bind
    #[clap(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[clap(long, default_value_t = 8080)]
    port: u16,

    /// Public origin this service is reachable at, used when rewriting
    /// templates (falls back to $OGCARD_PUBLIC_URL)
    #[clap(long)]
    public_url: Option<String>,

    /// Upstream fetch timeout in seconds
    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    fetch_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let rewrite = match args.public_url {
        Some(public_url) => RewriteConfig::new(Some(public_url)),
        None => RewriteConfig::from_env(),
    };
    if rewrite.base_origin.is_none() {
        warn!("No public origin configured; /normalize will leave remote WebP references unrewritten");
    }

    let state = AppState::new(rewrite, Duration::from_secs(args.fetch_timeout_secs))
        .context("Failed to construct HTTP client")?;

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;
    Ok(())
}
