//! artriddle - artistic riddle generator daemon
//!
//! Generates themed visual riddles and matching images with Gemini and
//! Imagen, and keeps each theme's riddle history in SQLite.

pub mod api;
pub mod db;
pub mod error;
pub mod gemini;
pub mod images;
pub mod locale;
pub mod riddle;
pub mod service;
pub mod store;
pub mod theme;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use db::Database;
use gemini::{GeminiClient, GeminiConfig, GenerativeBackend};
use images::ImageStore;
use riddle::RiddlePipeline;
use service::RiddleService;
use store::{RiddleStore, SqliteDocumentStore};
use theme::ThemeCatalog;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ARTRIDDLE_";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: Option<String>,
    pub gemini: GeminiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            db_path: None, // None = in-memory
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file (if present), then
    /// `ARTRIDDLE_*` environment variables (`__` separates nested keys).
    ///
    /// When no key is configured, `GEMINI_API_KEY` or `API_KEY` is used.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        if config.gemini.api_key.is_none() {
            config.gemini.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok();
        }

        Ok(config)
    }
}

/// The artriddle server instance
pub struct Server {
    config: Config,
    db: Arc<Database>,
    service: Arc<RiddleService>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server talking to Gemini
    pub async fn new(config: Config) -> Result<Self> {
        let client = GeminiClient::new(&config.gemini)?;
        if !client.is_configured() {
            warn!("No Gemini API key configured; generation requests will fail");
        }
        Self::with_backend(config, Arc::new(client)).await
    }

    /// Create a new server with an explicit generative backend
    pub async fn with_backend(
        config: Config,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Result<Self> {
        let db = Arc::new(Database::new(config.db_path.as_deref()).await?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let service = RiddleService::shared(
            ThemeCatalog::new(),
            RiddlePipeline::new(backend, &config.gemini),
            RiddleStore::new(Arc::new(SqliteDocumentStore::new(db.pool().clone()))),
            ImageStore::new(db.pool().clone()),
        );

        Ok(Self {
            config,
            db,
            service,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    fn router(&self) -> axum::Router {
        api::router(api::AppState {
            db: self.db.clone(),
            service: self.service.clone(),
        })
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("artriddle listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("artriddle shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
