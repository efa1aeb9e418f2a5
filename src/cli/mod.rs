pub mod app;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "twemauth")]
#[command(about = "Rotate passwords of the Redis instances behind a twemproxy pool")]
pub struct Args {
    /// Configuration file
    #[arg(short, long, default_value = twemauth::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// twemproxy pool file, overrides `proxy` in the configuration
    #[arg(long)]
    pub proxy: Option<PathBuf>,

    /// Credential store file, overrides `store` in the configuration
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Per-instance timeout in seconds, overrides `timeout` in the configuration
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Logs go to stderr so tables on stdout stay clean
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("twemauth=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
