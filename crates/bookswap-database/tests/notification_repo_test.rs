//! Integration tests for the notification repository.

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use bookswap_database::NotificationStore;
use bookswap_database::repositories::NotificationRepository;
use bookswap_entity::notification::{NewNotification, NotificationType};

fn new_notification(user_id: Uuid, title: &str) -> NewNotification {
    NewNotification::new(user_id, title, "Your textbook order was updated", NotificationType::Info)
}

#[tokio::test]
async fn test_list_count_and_read_flags() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let repo = NotificationRepository::new(db.pool.clone());
    let user = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let first = repo.create(&new_notification(user, "Offer received")).await.unwrap();
    let second = repo.create(&new_notification(user, "Offer accepted")).await.unwrap();
    repo.create(&new_notification(stranger, "Unrelated")).await.unwrap();

    let listed = repo.find_by_user(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
    assert!(listed.iter().all(|n| n.user_id == user));
    assert_eq!(repo.count_unread(user).await.unwrap(), 2);

    assert!(!repo.mark_read(first.id, stranger).await.unwrap());
    assert!(repo.mark_read(first.id, user).await.unwrap());
    assert_eq!(repo.count_unread(user).await.unwrap(), 1);

    assert_eq!(repo.mark_all_read(user).await.unwrap(), 1);
    assert_eq!(repo.count_unread(user).await.unwrap(), 0);

    assert!(repo.delete(second.id, user).await.unwrap());
    assert!(!repo.delete(second.id, user).await.unwrap());
    assert_eq!(repo.delete_all_for_user(user).await.unwrap(), 1);
    assert!(repo.find_by_user(user).await.unwrap().is_empty());
    assert_eq!(repo.find_by_user(stranger).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_older_than_keeps_recent_rows() {
    let Some(db) = helpers::TestDb::connect().await else {
        return;
    };
    let repo = NotificationRepository::new(db.pool.clone());
    let user = Uuid::new_v4();

    let old = repo.create(&new_notification(user, "Semester started")).await.unwrap();
    let recent = repo.create(&new_notification(user, "Book shipped")).await.unwrap();
    sqlx::query("UPDATE notifications SET created_at = $2 WHERE id = $1")
        .bind(old.id)
        .bind(Utc::now() - Duration::days(45))
        .execute(&db.pool)
        .await
        .unwrap();

    let removed = repo
        .delete_older_than(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert!(removed >= 1);

    let remaining: Vec<Uuid> = repo
        .find_by_user(user)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(remaining, vec![recent.id]);
}
