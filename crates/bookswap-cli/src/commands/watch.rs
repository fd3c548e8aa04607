//! Live notification view for one user.

use std::sync::Arc;

use clap::Args;

use crate::output::{self, OutputFormat};
use bookswap_core::config::AppConfig;
use bookswap_core::error::AppError;
use bookswap_realtime::{NotificationSync, PgChangeFeed, SyncSnapshot};
use bookswap_service::{UserIdentity, parse_id};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// User ID to follow
    #[arg(short, long)]
    pub user: String,
}

/// Follow notifications until Ctrl-C
pub async fn execute(
    args: &WatchArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let user = UserIdentity::user(parse_id(&args.user)?);
    let services = super::build_services(config).await?;
    let feed = Arc::new(
        PgChangeFeed::start(&services.db, config.notifications.channel_buffer_size).await?,
    );

    let sync = NotificationSync::new(
        services.notifications.clone(),
        feed.clone(),
        &config.notifications,
    );
    let mut snapshots = sync.subscribe();
    sync.start(Some(user.clone())).await;
    print_snapshot(&sync.snapshot(), format);

    println!("Watching notifications for {} (Ctrl-C to stop)", user.user_id);
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !snapshot.is_loading {
                    print_snapshot(&snapshot, format);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sync.shutdown();
    feed.shutdown().await;
    services.db.close().await;
    Ok(())
}

fn print_snapshot(snapshot: &SyncSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(snapshot),
        OutputFormat::Table => {
            output::print_kv("Total", &snapshot.total_count.to_string());
            output::print_kv("Unread", &snapshot.unread_count.to_string());
            if let Some(latest) = snapshot.notifications.first() {
                output::print_kv("Latest", &output::truncate(&latest.title, 48));
            }
            if snapshot.has_error {
                output::print_warning(&format!(
                    "Sync failing: {}",
                    snapshot.last_error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }
}
