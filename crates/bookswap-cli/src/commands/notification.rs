//! Notification CLI commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use bookswap_core::config::AppConfig;
use bookswap_core::error::AppError;
use bookswap_entity::notification::{NewNotification, Notification, NotificationType};
use bookswap_service::parse_id;

/// Arguments for notification commands
#[derive(Debug, Args)]
pub struct NotificationArgs {
    /// Notification subcommand
    #[command(subcommand)]
    pub command: NotificationCommand,
}

/// Notification subcommands
#[derive(Debug, Subcommand)]
pub enum NotificationCommand {
    /// List a user's notifications
    List {
        /// User ID
        #[arg(short, long)]
        user: String,
    },
    /// Send a notification to a user
    Create {
        /// User ID
        #[arg(short, long)]
        user: String,
        /// Title
        #[arg(short, long)]
        title: String,
        /// Message body
        #[arg(short, long)]
        message: String,
        /// Type: info, success, warning, error
        #[arg(long = "type", default_value = "info")]
        kind: String,
    },
    /// Mark one notification as read
    Read {
        /// User ID
        #[arg(short, long)]
        user: String,
        /// Notification ID
        id: String,
    },
    /// Mark all of a user's notifications as read
    ReadAll {
        /// User ID
        #[arg(short, long)]
        user: String,
    },
    /// Delete one notification
    Delete {
        /// User ID
        #[arg(short, long)]
        user: String,
        /// Notification ID
        id: String,
    },
    /// Remove every notification and broadcast view of a deleted profile
    Purge {
        /// User ID
        #[arg(short, long)]
        user: String,
    },
    /// Delete notifications older than the retention period
    Cleanup {
        /// Retention in days (defaults to `notifications.cleanup_after_days`)
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Notification display row for table output
#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    /// Notification ID
    id: String,
    /// Type
    #[tabled(rename = "type")]
    kind: String,
    /// Title
    title: String,
    /// Message
    message: String,
    /// Read flag
    read: String,
    /// Created at
    created_at: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind().to_string(),
            title: n.title.clone(),
            message: output::truncate(&n.message, 48),
            read: if n.read { "yes".into() } else { "no".into() },
            created_at: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute notification commands
pub async fn execute(
    args: &NotificationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::build_services(config).await?;
    let notifications = &services.notifications;

    match &args.command {
        NotificationCommand::List { user } => {
            let user_id = parse_id(user)?;
            let list = notifications.get_notifications(user_id).await?;
            let unread = notifications.get_unread_count(user_id).await?;

            match format {
                OutputFormat::Json => output::print_json(&list),
                OutputFormat::Table => {
                    let rows: Vec<NotificationRow> = list.iter().map(NotificationRow::from).collect();
                    output::print_list(&rows, format);
                    output::print_kv("Unread", &unread.to_string());
                }
            }
        }
        NotificationCommand::Create {
            user,
            title,
            message,
            kind,
        } => {
            let created = notifications
                .create_notification(NewNotification::new(
                    parse_id(user)?,
                    title.clone(),
                    message.clone(),
                    NotificationType::from_str_value(kind),
                ))
                .await?;
            output::print_success(&format!("Notification {} created", created.id));
        }
        NotificationCommand::Read { user, id } => {
            notifications
                .mark_as_read(parse_id(user)?, parse_id(id)?)
                .await?;
            output::print_success("Notification marked as read");
        }
        NotificationCommand::ReadAll { user } => {
            let count = notifications.mark_all_as_read(parse_id(user)?).await?;
            output::print_success(&format!("{count} notification(s) marked as read"));
        }
        NotificationCommand::Delete { user, id } => {
            notifications
                .delete_notification(parse_id(user)?, parse_id(id)?)
                .await?;
            output::print_success("Notification deleted");
        }
        NotificationCommand::Purge { user } => {
            let user_id = parse_id(user)?;
            let notifications_removed = notifications.delete_all_for_user(user_id).await?;
            let views_removed = services.broadcasts.forget_viewer(user_id).await?;
            output::print_success(&format!(
                "{notifications_removed} notification(s) and {views_removed} broadcast view(s) removed"
            ));
        }
        NotificationCommand::Cleanup { days } => {
            let days = days.unwrap_or(config.notifications.cleanup_after_days);
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            let count = notifications.cleanup_older_than(cutoff).await?;
            output::print_success(&format!(
                "{count} notification(s) older than {days} day(s) deleted"
            ));
        }
    }

    services.db.close().await;
    Ok(())
}
