use super::Args;
use anyhow::{Context, Result};
use std::io;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;
use twemauth::{AppConfig, CredentialStore, RedisConnector, Rotator, Session, Topology};

pub struct App {
    session: Session<RedisConnector>,
}

impl App {
    /// Load configuration, topology and credentials, then reconcile.
    ///
    /// Only a bad configuration or an unusable topology file fail here.
    pub fn new(args: Args) -> Result<Self> {
        let config = Self::config(&args)?;
        info!(
            proxy = %config.proxy.display(),
            store = %config.store.display(),
            timeout_secs = config.timeout.as_secs_f64(),
            "starting"
        );

        let topology = Topology::load(&config.proxy)
            .with_context(|| format!("Failed to load topology from '{}'", config.proxy.display()))?;
        let store = CredentialStore::load(&config.store);
        let rotator = Rotator::new(RedisConnector, config.timeout);

        Ok(Self {
            session: Session::start(topology, store, rotator),
        })
    }

    fn config(args: &Args) -> Result<AppConfig> {
        let mut config = AppConfig::from_file(&args.config)
            .with_context(|| format!("Failed to read configuration '{}'", args.config.display()))?;
        if let Some(proxy) = &args.proxy {
            config = config.proxy(proxy.clone());
        }
        if let Some(store) = &args.store {
            config = config.store(store.clone());
        }
        if let Some(secs) = args.timeout {
            config = config.timeout(Duration::from_secs(secs));
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = io::stdout();
        self.session
            .run(stdin, &mut stdout)
            .await
            .context("Console I/O failed")
    }
}
