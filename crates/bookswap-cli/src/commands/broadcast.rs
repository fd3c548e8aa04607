//! Admin broadcast CLI commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use bookswap_core::config::AppConfig;
use bookswap_core::error::AppError;
use bookswap_entity::broadcast::{
    Broadcast, BroadcastPatch, BroadcastPriority, NewBroadcast, TargetAudience,
};
use bookswap_entity::notification::NotificationType;
use bookswap_service::{UserIdentity, parse_id};

/// Arguments for broadcast commands
#[derive(Debug, Args)]
pub struct BroadcastArgs {
    /// Admin profile ID recorded as the author of changes
    #[arg(long, global = true)]
    pub admin: Option<String>,

    /// Broadcast subcommand
    #[command(subcommand)]
    pub command: BroadcastCommand,
}

/// Broadcast subcommands
#[derive(Debug, Subcommand)]
pub enum BroadcastCommand {
    /// Show recent broadcasts regardless of state
    List {
        /// Number of entries
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
    /// Show broadcasts currently visible to a viewer
    Active {
        /// Viewer profile ID; omit for a guest
        #[arg(short, long)]
        user: Option<String>,
        /// Treat the viewer as an administrator
        #[arg(long)]
        as_admin: bool,
        /// Only broadcasts the viewer has not seen yet
        #[arg(long)]
        unviewed: bool,
    },
    /// Record that a viewer has seen a broadcast
    View {
        /// Broadcast ID
        id: String,
        /// Viewer profile ID; omit for a guest
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Publish a broadcast
    Create {
        /// Title
        #[arg(short, long)]
        title: String,
        /// Message body
        #[arg(short, long)]
        message: String,
        /// Type: info, success, warning, error
        #[arg(long = "type", default_value = "info")]
        kind: String,
        /// Priority: low, normal, high, urgent
        #[arg(short, long, default_value = "normal")]
        priority: String,
        /// Audience: all, users, admin
        #[arg(short, long, default_value = "all")]
        audience: String,
        /// Hours until the broadcast expires
        #[arg(long)]
        expires_in_hours: Option<i64>,
    },
    /// Change an existing broadcast
    Update {
        /// Broadcast ID
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New message body
        #[arg(short, long)]
        message: Option<String>,
        /// New priority: low, normal, high, urgent
        #[arg(short, long)]
        priority: Option<String>,
        /// New audience: all, users, admin
        #[arg(short, long)]
        audience: Option<String>,
        /// Switch the broadcast back on
        #[arg(long)]
        activate: bool,
        /// Hours from now until the broadcast expires
        #[arg(long, conflicts_with = "no_expiry")]
        expires_in_hours: Option<i64>,
        /// Keep the broadcast up until it is deactivated
        #[arg(long)]
        no_expiry: bool,
    },
    /// Switch a broadcast off
    Deactivate {
        /// Broadcast ID
        id: String,
    },
    /// Delete a broadcast
    Delete {
        /// Broadcast ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Deactivate expired broadcasts
    Cleanup,
    /// Re-enable broadcasts after the table has been created
    Enable,
}

/// Broadcast display row for table output
#[derive(Debug, Serialize, Tabled)]
struct BroadcastRow {
    /// Broadcast ID
    id: String,
    /// Priority
    priority: String,
    /// Audience
    audience: String,
    /// Title
    title: String,
    /// Message
    message: String,
    /// Active flag
    active: String,
    /// Expires at
    expires_at: String,
}

impl From<&Broadcast> for BroadcastRow {
    fn from(b: &Broadcast) -> Self {
        Self {
            id: b.id.to_string(),
            priority: b.priority().as_str().to_string(),
            audience: b.audience().to_string(),
            title: b.title.clone(),
            message: output::truncate(&b.message, 40),
            active: if b.active { "yes".into() } else { "no".into() },
            expires_at: b
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute broadcast commands
pub async fn execute(
    args: &BroadcastArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::build_services(config).await?;
    let broadcasts = &services.broadcasts;
    let admin = UserIdentity::admin(match &args.admin {
        Some(raw) => parse_id(raw)?,
        None => Uuid::nil(),
    });

    if broadcasts.is_disabled() && !matches!(args.command, BroadcastCommand::Enable) {
        output::print_warning(
            "Broadcasts are disabled for this installation; run `bookswap broadcasts enable` once the table exists.",
        );
    }

    match &args.command {
        BroadcastCommand::List { limit } => {
            let list = broadcasts.get_all_broadcasts(&admin, *limit).await?;
            print_broadcasts(&list, format);
        }
        BroadcastCommand::Active {
            user,
            as_admin,
            unviewed,
        } => {
            let viewer = viewer(user.as_deref(), *as_admin)?;
            let list = if *unviewed {
                broadcasts.get_unviewed_broadcasts(viewer.as_ref()).await?
            } else {
                broadcasts.get_active_broadcasts(viewer.as_ref()).await?
            };
            print_broadcasts(&list, format);
        }
        BroadcastCommand::View { id, user } => {
            let viewer = viewer(user.as_deref(), false)?;
            let broadcast = broadcasts
                .get_broadcast(viewer.as_ref(), parse_id(id)?)
                .await?;

            match broadcasts
                .mark_broadcast_viewed(viewer.as_ref(), &broadcast)
                .await?
            {
                Some(notification) => output::print_success(&format!(
                    "Broadcast viewed; notification {} created",
                    notification.id
                )),
                None => output::print_success("Broadcast marked as viewed"),
            }
        }
        BroadcastCommand::Create {
            title,
            message,
            kind,
            priority,
            audience,
            expires_in_hours,
        } => {
            let input = NewBroadcast {
                title: title.clone(),
                message: message.clone(),
                broadcast_type: NotificationType::from_str_value(kind),
                priority: BroadcastPriority::from_str_value(priority),
                target_audience: TargetAudience::from_str_value(audience),
                created_by: None,
                expires_at: expires_in_hours.map(|h| Utc::now() + Duration::hours(h)),
            };
            let created = broadcasts.create_broadcast(&admin, input).await?;
            output::print_success(&format!(
                "Broadcast {} published to '{}' (priority: {})",
                created.id, created.target_audience, created.priority
            ));
        }
        BroadcastCommand::Update {
            id,
            title,
            message,
            priority,
            audience,
            activate,
            expires_in_hours,
            no_expiry,
        } => {
            let patch = BroadcastPatch {
                title: title.clone(),
                message: message.clone(),
                priority: priority.as_deref().map(BroadcastPriority::from_str_value),
                target_audience: audience.as_deref().map(TargetAudience::from_str_value),
                active: activate.then_some(true),
                expires_at: expires_in_hours.map(|h| Utc::now() + Duration::hours(h)),
                clear_expiry: *no_expiry,
            };
            let updated = broadcasts
                .update_broadcast(&admin, parse_id(id)?, patch)
                .await?;
            print_broadcasts(std::slice::from_ref(&updated), format);
        }
        BroadcastCommand::Deactivate { id } => {
            let updated = broadcasts
                .deactivate_broadcast(&admin, parse_id(id)?)
                .await?;
            output::print_success(&format!("Broadcast '{}' deactivated", updated.title));
        }
        BroadcastCommand::Delete { id, force } => {
            let broadcast_id = parse_id(id)?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete broadcast {broadcast_id} and its view records?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            broadcasts.delete_broadcast(&admin, broadcast_id).await?;
            output::print_success("Broadcast deleted");
        }
        BroadcastCommand::Cleanup => {
            let count = broadcasts.cleanup_expired().await?;
            output::print_success(&format!("{count} expired broadcast(s) deactivated"));
        }
        BroadcastCommand::Enable => {
            broadcasts.enable().await?;
            output::print_success("Broadcasts enabled");
        }
    }

    services.db.close().await;
    Ok(())
}

fn viewer(user: Option<&str>, as_admin: bool) -> Result<Option<UserIdentity>, AppError> {
    let Some(raw) = user else {
        return Ok(None);
    };
    let id = parse_id(raw)?;
    Ok(Some(if as_admin {
        UserIdentity::admin(id)
    } else {
        UserIdentity::user(id)
    }))
}

fn print_broadcasts(list: &[Broadcast], format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(list),
        OutputFormat::Table => {
            let rows: Vec<BroadcastRow> = list.iter().map(BroadcastRow::from).collect();
            output::print_list(&rows, format);
        }
    }
}
