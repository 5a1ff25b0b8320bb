mod common;

use std::time::Duration;

use common::{draft, identity, MemoryHarness, TestResult};
use dewana_events::{
    EventError, PublicationState, RsvpForm, RsvpFormState, RsvpSession, RsvpStatus,
    RsvpSubmission,
};

fn form(email: &str, status: RsvpStatus, guest_count: Option<i64>) -> RsvpForm {
    RsvpForm {
        guest_name: "Meera".into(),
        guest_email: email.into(),
        guest_phone: Some("+91 98450 00000".into()),
        status,
        guest_count,
        message: Some("Can't wait".into()),
    }
}

#[tokio::test]
async fn unpublished_event_is_rejected_without_store_call() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), Some("Host"));
    let details = h
        .services
        .events
        .create_event(&host, &draft("Draft Party", PublicationState::Draft))
        .await?;

    let mut session = RsvpSession::new(form("guest@example.com", RsvpStatus::Yes, Some(2)));
    let err = h
        .services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await
        .expect_err("draft events take no responses");

    assert!(matches!(err, EventError::NotPublished));
    assert_eq!(err.to_string(), "Event not yet published.");
    assert_eq!(session.state(), RsvpFormState::NoResponse);
    assert!(h.store.rsvp_create_calls().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn closed_rsvps_are_rejected_locally() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let mut closed = draft("Closed", PublicationState::Published);
    closed.rsvp_enabled = false;
    let details = h.services.events.create_event(&host, &closed).await?;

    let mut session = RsvpSession::new(form("guest@example.com", RsvpStatus::Yes, None));
    let err = h
        .services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await
        .expect_err("closed events take no responses");

    assert!(matches!(err, EventError::RsvpClosed));
    assert!(err.is_local_rejection());
    assert!(h.store.rsvp_create_calls().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_call_receives_normalised_payload() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Sangeet", PublicationState::Published))
        .await?;

    let mut session = RsvpSession::new(form("  A@B.COM ", RsvpStatus::Yes, Some(25)));
    h.services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await?;

    let calls = h.store.rsvp_create_calls().await;
    assert_eq!(
        calls,
        vec![(
            details.event.id,
            RsvpSubmission {
                guest_name: "Meera".into(),
                guest_email: "a@b.com".into(),
                guest_phone: Some("+91 98450 00000".into()),
                status: RsvpStatus::Yes,
                guest_count: Some(10),
                message: Some("Can't wait".into()),
            }
        )]
    );

    assert!(session.is_confirmed());
    let link = session.calendar_link().expect("yes responses get a calendar link");
    assert!(link.starts_with("https://calendar.google.com/calendar/render?action=TEMPLATE"));
    assert!(link.contains("text=Sangeet"));
    Ok(())
}

#[tokio::test]
async fn maybe_response_ignores_guest_count() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Picnic", PublicationState::Published))
        .await?;

    let mut session = RsvpSession::new(form("dev@example.com", RsvpStatus::Maybe, Some(40)));
    h.services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await?;

    let stored = session.response().expect("confirmed session holds the response");
    assert_eq!(stored.status, RsvpStatus::Maybe);
    assert_eq!(stored.guest_count, None);
    assert!(session
        .calendar_link()
        .is_some_and(|link| link.contains("text=Picnic")));
    Ok(())
}

#[tokio::test]
async fn declined_response_still_gets_calendar_link() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Gala", PublicationState::Published))
        .await?;

    let mut session = RsvpSession::new(form("no@example.com", RsvpStatus::No, None));
    h.services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await?;

    assert!(session.is_confirmed());
    let link = session
        .calendar_link()
        .expect("every confirmed response gets a calendar link");
    assert!(link.contains("text=Gala"));
    Ok(())
}

#[tokio::test]
async fn returning_guest_is_confirmed_from_lookup() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let guest = identity(2, Some("guest@example.com"), Some("Guest"));
    let details = h
        .services
        .events
        .create_event(&host, &draft("Reunion", PublicationState::Published))
        .await?;
    let event = &details.event;

    let mut first = h.services.rsvps.open_session(event, Some(&guest)).await?;
    assert_eq!(first.state(), RsvpFormState::NoResponse);
    assert_eq!(first.form().guest_email, "guest@example.com");
    assert_eq!(first.form().guest_name, "Guest");
    h.services.rsvps.submit(&mut first, event, Some(&guest)).await?;
    assert!(first.is_confirmed());

    // a fresh page load short-circuits to the recorded response
    let reopened = h.services.rsvps.open_session(event, Some(&guest)).await?;
    assert!(reopened.is_confirmed());
    assert_eq!(reopened.response().map(|r| r.guest_email.as_str()), Some("guest@example.com"));

    // a stale form submitted again is confirmed without another create call
    let mut stale = RsvpSession::new(RsvpForm::prefilled(Some(&guest)));
    h.services.rsvps.submit(&mut stale, event, Some(&guest)).await?;
    assert!(stale.is_confirmed());

    assert_eq!(h.store.rsvp_create_calls().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn store_rejection_is_surfaced_and_form_stays_submittable() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Launch", PublicationState::Published))
        .await?;
    let event = &details.event;

    let mut first = RsvpSession::new(form("dup@example.com", RsvpStatus::Yes, Some(1)));
    h.services.rsvps.submit(&mut first, event, None).await?;

    let mut second = RsvpSession::new(form("DUP@example.com", RsvpStatus::No, None));
    let err = h
        .services
        .rsvps
        .submit(&mut second, event, None)
        .await
        .expect_err("second response for the same email is rejected by the store");

    assert!(matches!(err, EventError::RsvpAlreadyExists));
    assert_eq!(second.state(), RsvpFormState::NoResponse);
    assert_eq!(second.last_error(), Some(err.to_string().as_str()));
    assert_eq!(h.store.rsvp_create_calls().await.len(), 2);
    assert_eq!(h.services.rsvps.guard().in_flight(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn concurrent_submissions_for_one_guest_are_serialised() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Mela", PublicationState::Published))
        .await?;
    let event = &details.event;
    h.store.set_create_delay(Some(Duration::from_millis(200))).await;

    let mut a = RsvpSession::new(form("same@example.com", RsvpStatus::Yes, Some(2)));
    let mut b = RsvpSession::new(form("same@example.com", RsvpStatus::Yes, Some(2)));
    let (first, second) = tokio::join!(
        h.services.rsvps.submit(&mut a, event, None),
        h.services.rsvps.submit(&mut b, event, None),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(EventError::SubmissionInProgress)));
    assert_eq!(b.state(), RsvpFormState::NoResponse);
    assert_eq!(h.store.rsvp_create_calls().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn notification_is_best_effort() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let guest = identity(2, Some("guest@example.com"), Some("Guest"));
    let other = identity(3, Some("other@example.com"), Some("Other"));
    let details = h
        .services
        .events
        .create_event(&host, &draft("Diwali Night", PublicationState::Published))
        .await?;
    let event = &details.event;

    let mut session = h.services.rsvps.open_session(event, Some(&guest)).await?;
    h.services.rsvps.submit(&mut session, event, Some(&guest)).await?;
    let notifications = h.services.notifications.list_for_user(&guest).await?;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "You're all set for \"Diwali Night\".");
    assert_eq!(notifications[0].event_id.as_deref(), Some(event.public_id.as_str()));

    h.store.set_fail_notifications(true);
    let mut failing = h.services.rsvps.open_session(event, Some(&other)).await?;
    h.services.rsvps.submit(&mut failing, event, Some(&other)).await?;
    assert!(failing.is_confirmed(), "a failed notification must not fail the response");

    let mut anonymous = RsvpSession::new(form("anon@example.com", RsvpStatus::Yes, None));
    h.store.set_fail_notifications(false);
    h.services.rsvps.submit(&mut anonymous, event, None).await?;
    assert_eq!(h.store.notification_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_form_is_rejected_before_store_call() -> TestResult {
    let h = MemoryHarness::new()?;
    let host = identity(1, Some("host@example.com"), None);
    let details = h
        .services
        .events
        .create_event(&host, &draft("Open Day", PublicationState::Published))
        .await?;

    let mut session = RsvpSession::new(form("not-an-email", RsvpStatus::Yes, None));
    let err = h
        .services
        .rsvps
        .submit(&mut session, &details.event, None)
        .await
        .expect_err("invalid email");
    assert!(matches!(err, EventError::Validation { .. }));
    assert_eq!(session.state(), RsvpFormState::NoResponse);
    assert!(h.store.rsvp_create_calls().await.is_empty());
    Ok(())
}
