use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use bookswap_core::config::notifications::NotificationConfig;
use bookswap_core::error::AppError;
use bookswap_core::result::AppResult;
use bookswap_entity::notification::Notification;
use bookswap_service::UserIdentity;

use super::{NotificationSource, NotificationSync};
use crate::feed::{ChangeEvent, ChangeKind, MemoryChangeFeed};

#[derive(Debug, Default)]
struct ScriptedSource {
    /// Responses returned before falling back to `lists`.
    script: Mutex<VecDeque<AppResult<Vec<Notification>>>>,
    lists: Mutex<HashMap<Uuid, Vec<Notification>>>,
    calls: Mutex<Vec<(Uuid, Instant)>>,
    invalidations: AtomicUsize,
    /// Locked by a test to hold fetches open.
    hold: tokio::sync::Mutex<()>,
}

impl ScriptedSource {
    fn set_list(&self, user_id: Uuid, list: Vec<Notification>) {
        self.lists.lock().unwrap().insert(user_id, list);
    }

    fn fail_next(&self, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(Err(AppError::database("connection reset by peer")));
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    fn calls_for(&self, user_id: Uuid) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .count()
    }
}

#[async_trait]
impl NotificationSource for ScriptedSource {
    async fn fetch_notifications(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        self.calls.lock().unwrap().push((user_id, Instant::now()));
        let _hold = self.hold.lock().await;

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn invalidate(&self, _user_id: Uuid) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

fn notification(user_id: Uuid, read: bool) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id,
        title: "Offer received".into(),
        message: "Someone offered R150 for Calculus 8th ed.".into(),
        notification_type: "info".into(),
        read,
        created_at: Utc::now(),
    }
}

fn setup(config: &NotificationConfig) -> (NotificationSync, Arc<ScriptedSource>, Arc<MemoryChangeFeed>) {
    let source = Arc::new(ScriptedSource::default());
    let feed = Arc::new(MemoryChangeFeed::new(64));
    let sync = NotificationSync::new(source.clone(), feed.clone(), config);
    (sync, source, feed)
}

#[tokio::test(start_paused = true)]
async fn test_refresh_deduplicates_by_id() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    let first = notification(user.user_id, false);
    let second = notification(user.user_id, true);
    source.set_list(
        user.user_id,
        vec![first.clone(), second.clone(), first.clone()],
    );

    let mut rx = sync.subscribe();
    sync.start(Some(user)).await;

    let snapshot = sync.snapshot();
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(snapshot.unread_count, 1);
    assert_eq!(snapshot.notifications[0].id, first.id);
    assert_eq!(snapshot.notifications[1].id, second.id);
    assert!(!snapshot.is_loading);
    assert!(rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refresh_is_a_noop() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    sync.start(Some(user)).await;
    assert_eq!(source.call_count(), 1);

    let hold = source.hold.lock().await;
    tokio::join!(sync.refresh_notifications(), async {
        tokio::task::yield_now().await;
        assert!(sync.snapshot().is_loading);
        sync.refresh_notifications().await;
        assert_eq!(source.call_count(), 2);
        drop(hold);
    });

    assert_eq!(source.call_count(), 2);
    assert!(!sync.snapshot().is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_retry_schedule_then_error_surfaces_with_data_kept() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    source.set_list(
        user.user_id,
        vec![notification(user.user_id, false), notification(user.user_id, false)],
    );
    sync.start(Some(user)).await;
    assert_eq!(sync.snapshot().total_count, 2);

    source.fail_next(4);
    sync.refresh_notifications().await;
    assert!(!sync.snapshot().has_error);

    tokio::time::sleep(Duration::from_secs(120)).await;

    let times = source.call_times();
    assert_eq!(times.len(), 5);
    let gaps: Vec<Duration> = times[1..].windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_secs(5),
            Duration::from_secs(15),
            Duration::from_secs(30)
        ]
    );

    let snapshot = sync.snapshot();
    assert!(snapshot.has_error);
    assert!(snapshot.last_error.is_some());
    assert_eq!(snapshot.total_count, 2);

    sync.clear_error();
    assert!(!sync.snapshot().has_error);
    assert_eq!(sync.snapshot().total_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_success_cancels_pending_retry() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    source.fail_next(1);
    sync.start(Some(user)).await;
    assert_eq!(source.call_count(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    sync.refresh_notifications().await;
    assert_eq!(source.call_count(), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.call_count(), 2);
    assert!(!sync.snapshot().has_error);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_triggers_one_refresh() {
    let (sync, source, feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    sync.start(Some(user.clone())).await;
    assert_eq!(source.call_count(), 1);

    for _ in 0..5 {
        feed.publish(ChangeEvent::new(ChangeKind::Update, user.user_id, None))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(source.call_count(), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.call_count(), 2);
    assert_eq!(source.invalidations.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_only_inserts_refresh_while_failing() {
    let config = NotificationConfig {
        retry_delays_ms: vec![60_000],
        ..NotificationConfig::default()
    };
    let (sync, source, feed) = setup(&config);
    let user = UserIdentity::user(Uuid::new_v4());
    source.set_list(user.user_id, vec![notification(user.user_id, false)]);
    source.fail_next(1);
    sync.start(Some(user.clone())).await;
    assert_eq!(source.call_count(), 1);

    feed.publish(ChangeEvent::new(ChangeKind::Update, user.user_id, None))
        .await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.call_count(), 1);
    assert_eq!(source.invalidations.load(Ordering::SeqCst), 0);

    feed.publish(ChangeEvent::new(
        ChangeKind::Insert,
        user.user_id,
        Some(Uuid::new_v4()),
    ))
    .await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.call_count(), 2);
    assert_eq!(source.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(sync.snapshot().total_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_switching_user_resets_state_and_subscription() {
    let (sync, source, feed) = setup(&NotificationConfig::default());
    let alice = UserIdentity::user(Uuid::new_v4());
    let bob = UserIdentity::user(Uuid::new_v4());
    source.set_list(alice.user_id, vec![notification(alice.user_id, false)]);
    source.set_list(
        bob.user_id,
        vec![notification(bob.user_id, false), notification(bob.user_id, true)],
    );

    sync.start(Some(alice.clone())).await;
    assert_eq!(sync.snapshot().total_count, 1);

    sync.set_user(None).await;
    assert_eq!(sync.snapshot().total_count, 0);
    assert!(sync.current_user().is_none());

    sync.set_user(Some(bob.clone())).await;
    assert_eq!(sync.snapshot().total_count, 2);
    assert_eq!(sync.snapshot().unread_count, 1);

    feed.publish(ChangeEvent::new(ChangeKind::Insert, alice.user_id, None))
        .await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.calls_for(alice.user_id), 1);
    assert_eq!(source.calls_for(bob.user_id), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_previous_user_is_discarded() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let alice = UserIdentity::user(Uuid::new_v4());
    source.set_list(alice.user_id, vec![notification(alice.user_id, false)]);

    let hold = source.hold.lock().await;
    tokio::join!(sync.start(Some(alice)), async {
        tokio::task::yield_now().await;
        sync.set_user(None).await;
        drop(hold);
    });

    let snapshot = sync.snapshot();
    assert_eq!(snapshot.total_count, 0);
    assert!(!snapshot.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_no_user_means_no_fetch() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    sync.start(None).await;
    sync.refresh_notifications().await;

    assert_eq!(source.call_count(), 0);
    assert_eq!(sync.snapshot(), Default::default());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_retries() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    source.fail_next(1);
    sync.start(Some(UserIdentity::user(Uuid::new_v4()))).await;

    sync.shutdown();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clear_error_rearms_retry_schedule() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let user = UserIdentity::user(Uuid::new_v4());
    source.set_list(user.user_id, vec![notification(user.user_id, false)]);
    sync.start(Some(user)).await;

    source.fail_next(4);
    sync.refresh_notifications().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.call_count(), 5);
    assert!(sync.snapshot().has_error);

    sync.clear_error();
    source.fail_next(1);
    sync.refresh_notifications().await;
    assert_eq!(source.call_count(), 6);
    assert!(!sync.snapshot().has_error);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(source.call_count(), 7);
    let snapshot = sync.snapshot();
    assert!(!snapshot.has_error);
    assert_eq!(snapshot.total_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_publishes_idle_state() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let mut rx = sync.subscribe();

    let hold = source.hold.lock().await;
    tokio::join!(sync.start(Some(UserIdentity::user(Uuid::new_v4()))), async {
        tokio::task::yield_now().await;
        assert!(rx.borrow_and_update().is_loading);

        sync.shutdown();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_loading);
        drop(hold);
    });

    assert!(!sync.snapshot().is_loading);
    assert!(sync.current_user().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_published_snapshot_matches_final_state_under_contention() {
    let (sync, source, _feed) = setup(&NotificationConfig::default());
    let sync = Arc::new(sync);
    let user = UserIdentity::user(Uuid::new_v4());
    source.set_list(
        user.user_id,
        vec![notification(user.user_id, false), notification(user.user_id, true)],
    );
    sync.start(Some(user)).await;

    let mut tasks = Vec::new();
    for i in 0..64 {
        let sync = Arc::clone(&sync);
        tasks.push(tokio::spawn(async move {
            if i % 4 == 0 {
                sync.clear_error();
            } else {
                sync.refresh_notifications().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = sync.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(snapshot.unread_count, 1);
}
