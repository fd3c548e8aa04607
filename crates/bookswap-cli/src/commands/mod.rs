//! CLI command definitions and dispatch.

pub mod broadcast;
pub mod migrate;
pub mod notification;
pub mod quote;
pub mod watch;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use bookswap_cache::{CacheManager, FileLocalStore};
use bookswap_core::config::AppConfig;
use bookswap_core::error::AppError;
use bookswap_core::resilience::CircuitBreaker;
use bookswap_database::DatabasePool;
use bookswap_database::repositories::{
    BroadcastRepository, BroadcastViewRepository, NotificationRepository,
};
use bookswap_service::{BroadcastService, NotificationService};

/// BookSwap: notifications, admin broadcasts and courier quotes
#[derive(Debug, Parser)]
#[command(name = "bookswap", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Per-user notifications
    #[command(alias = "notif")]
    Notifications(notification::NotificationArgs),
    /// Admin broadcasts
    Broadcasts(broadcast::BroadcastArgs),
    /// Courier delivery quotes
    Quotes(quote::QuoteArgs),
    /// Follow a user's notifications live
    Watch(watch::WatchArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Notifications(args) => notification::execute(args, config, self.format).await,
            Commands::Broadcasts(args) => broadcast::execute(args, config, self.format).await,
            Commands::Quotes(args) => quote::execute(args, config, self.format).await,
            Commands::Watch(args) => watch::execute(args, config, self.format).await,
        }
    }
}

/// Services wired against the configured database.
pub struct Services {
    pub db: DatabasePool,
    pub notifications: Arc<NotificationService>,
    pub broadcasts: Arc<BroadcastService>,
}

/// Helper: connect to the database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: build the notification and broadcast services
pub async fn build_services(config: &AppConfig) -> Result<Services, AppError> {
    let db = connect(config).await?;
    let pool = db.pool().clone();

    let cache = Arc::new(CacheManager::new(&config.cache));
    let notifications = Arc::new(NotificationService::new(
        Arc::new(NotificationRepository::new(pool.clone())),
        cache,
        &config.notifications,
    ));

    let local = Arc::new(FileLocalStore::open(&config.local_store.path).await?);
    let breaker = Arc::new(CircuitBreaker::new(
        "broadcasts",
        config.broadcasts.breaker(),
    ));
    let broadcasts = Arc::new(BroadcastService::new(
        Arc::new(BroadcastRepository::new(pool.clone())),
        Arc::new(BroadcastViewRepository::new(pool)),
        Arc::clone(&notifications),
        local,
        breaker,
        &config.broadcasts,
    ));
    broadcasts.load_persisted_state().await?;

    Ok(Services {
        db,
        notifications,
        broadcasts,
    })
}
