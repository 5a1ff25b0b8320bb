//! Behaviour every RSVP store must share, run against both implementations.

mod common;

use std::sync::Arc;

use common::{draft, SqliteHarness, TestResult};
use dewana_events::{
    EventError, EventRepository, InMemoryStore, NewEvent, NewNotification,
    NotificationRepository, PublicationState, RsvpRepository, RsvpStatus, RsvpSubmission,
    ViewRepository,
};

fn submission(email: &str, status: RsvpStatus) -> RsvpSubmission {
    RsvpSubmission {
        guest_name: "Asha".into(),
        guest_email: email.into(),
        guest_phone: None,
        status,
        guest_count: (status == RsvpStatus::Yes).then_some(2),
        message: None,
    }
}

async fn seed_event<S>(store: &S, user_id: i64, slug: &str) -> TestResult<i64>
where
    S: EventRepository + ?Sized,
{
    let (fields, sub_events) = draft("Contract", PublicationState::Published).resolve()?;
    let event = store
        .create_event(&NewEvent {
            user_id,
            public_id: format!("evt-{slug}"),
            slug: slug.into(),
            fields,
            sub_events,
        })
        .await?;
    Ok(event.id)
}

async fn rejects_second_create_for_same_pair<S>(store: &S, event_id: i64) -> TestResult
where
    S: RsvpRepository + ?Sized,
{
    let first = store
        .create_rsvp(event_id, &submission("asha@example.com", RsvpStatus::Yes))
        .await?;
    assert_eq!(first.guest_email, "asha@example.com");
    assert_eq!(first.guest_count, Some(2));

    let err = store
        .create_rsvp(event_id, &submission("asha@example.com", RsvpStatus::No))
        .await
        .expect_err("duplicate (event, email) must be rejected");
    assert!(matches!(err, EventError::RsvpAlreadyExists));

    let err = store
        .create_rsvp(event_id, &submission("ASHA@example.com", RsvpStatus::Maybe))
        .await
        .expect_err("email comparison ignores case");
    assert!(matches!(err, EventError::RsvpAlreadyExists));

    let rsvps = store.list_rsvps_for_event(event_id).await?;
    assert_eq!(rsvps.len(), 1);
    assert_eq!(rsvps[0].status, RsvpStatus::Yes);

    let latest = store.find_latest_rsvp(event_id, "Asha@Example.com").await?;
    assert_eq!(latest.map(|r| r.public_id), Some(first.public_id));
    assert!(store.find_latest_rsvp(event_id, "nobody@example.com").await?.is_none());

    let other = store
        .create_rsvp(event_id, &submission("ravi@example.com", RsvpStatus::Maybe))
        .await?;
    assert_eq!(other.guest_count, None);
    assert_eq!(store.list_event_ids_for_guest("RAVI@example.com").await?, vec![event_id]);
    Ok(())
}

#[tokio::test]
async fn in_memory_store_rejects_duplicate_responses() -> TestResult {
    let store = InMemoryStore::new();
    let event_id = seed_event(&store, 1, "memory-contract").await?;
    rejects_second_create_for_same_pair(&store, event_id).await
}

#[tokio::test]
async fn sqlite_store_rejects_duplicate_responses() -> TestResult {
    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    let event_id = seed_event(&h.store, host.user_id, "sqlite-contract").await?;
    rejects_second_create_for_same_pair(&h.store, event_id).await
}

#[tokio::test]
async fn responses_to_unknown_events_are_not_found() -> TestResult {
    let memory = InMemoryStore::new();
    let err = memory
        .create_rsvp(404, &submission("a@b.com", RsvpStatus::Yes))
        .await
        .expect_err("unknown event");
    assert!(matches!(err, EventError::EventNotFound { .. }));

    let h = SqliteHarness::new().await?;
    let err = h
        .store
        .create_rsvp(404, &submission("a@b.com", RsvpStatus::Yes))
        .await
        .expect_err("unknown event");
    assert!(matches!(err, EventError::EventNotFound { .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_creates_record_exactly_one_response() -> TestResult {
    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    let event_id = seed_event(&h.store, host.user_id, "race").await?;
    let store = Arc::new(h.store.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create_rsvp(event_id, &submission("race@example.com", RsvpStatus::Yes))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => created += 1,
            Err(EventError::RsvpAlreadyExists) => {}
            Err(other) => return Err(other.into()),
        }
    }
    assert_eq!(created, 1);
    Ok(())
}

#[tokio::test]
async fn both_stores_reject_slug_collisions() -> TestResult {
    let memory = InMemoryStore::new();
    seed_event(&memory, 1, "same-slug").await?;
    let err = seed_event(&memory, 1, "same-slug").await.expect_err("slug taken");
    assert!(err.to_string().contains("same-slug"));

    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    seed_event(&h.store, host.user_id, "same-slug").await?;
    let (fields, _) = draft("Again", PublicationState::Draft).resolve()?;
    let err = h
        .store
        .create_event(&NewEvent {
            user_id: host.user_id,
            public_id: "evt-other".into(),
            slug: "same-slug".into(),
            fields,
            sub_events: Vec::new(),
        })
        .await
        .expect_err("slug taken");
    assert!(matches!(err, EventError::SlugTaken { .. }));
    Ok(())
}

// The store's writes must be committed by the time the call returns, so a
// separately held connection sees every one of them.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_responses_are_visible_to_other_connections() -> TestResult {
    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    let event_id = seed_event(&h.store, host.user_id, "visible-rsvps").await?;
    let mut reader = h.pool.acquire().await?;

    for n in 1..=20_i64 {
        let email = format!("guest{n}@example.com");
        h.store
            .create_rsvp(event_id, &submission(&email, RsvpStatus::Maybe))
            .await?;

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rsvps WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(&mut *reader)
            .await?;
        assert_eq!(stored, n, "response {n} not visible after create");
    }

    assert_eq!(h.store.list_rsvps_for_event(event_id).await?.len(), 20);
    assert!(h
        .store
        .find_latest_rsvp(event_id, "guest20@example.com")
        .await?
        .is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_view_counts_are_visible_to_other_connections() -> TestResult {
    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    let event_id = seed_event(&h.store, host.user_id, "visible-views").await?;
    let mut reader = h.pool.acquire().await?;

    for n in 1..=20_i64 {
        assert_eq!(h.store.increment_view_count(event_id).await?, n);

        let stored: i64 = sqlx::query_scalar("SELECT view_count FROM events WHERE id = ?")
            .bind(event_id)
            .fetch_one(&mut *reader)
            .await?;
        assert_eq!(stored, n, "view {n} not visible after increment");
    }

    let err = h
        .store
        .increment_view_count(event_id + 1000)
        .await
        .expect_err("unknown event");
    assert!(matches!(err, EventError::EventNotFound { .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_notifications_are_visible_to_other_connections() -> TestResult {
    let h = SqliteHarness::new().await?;
    let host = h.register("host@example.com", "Host").await?;
    let event_id = seed_event(&h.store, host.user_id, "visible-notes").await?;
    let mut reader = h.pool.acquire().await?;

    for n in 1..=10_i64 {
        let created = h
            .store
            .create_notification(&NewNotification {
                user_id: host.user_id,
                title: format!("Note {n}"),
                message: "You're all set.".into(),
                kind: NewNotification::KIND_SYSTEM.into(),
                related_event_id: Some(event_id),
            })
            .await?;
        assert_eq!(created.event_id.as_deref(), Some("evt-visible-notes"));

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
            .bind(host.user_id)
            .fetch_one(&mut *reader)
            .await?;
        assert_eq!(stored, n, "notification {n} not visible after create");
    }

    let listed = h.store.list_notifications(host.user_id).await?;
    assert_eq!(listed.len(), 10);
    Ok(())
}
