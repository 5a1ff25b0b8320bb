use std::sync::Arc;

use tracing::{info, warn};

use dewana_auth::Identity;

use super::{NotificationService, SubmissionGuard};
use crate::calendar::event_calendar_link;
use crate::entities::{Event, Rsvp, RsvpForm, RsvpSession};
use crate::lifecycle::GraceWindow;
use crate::repositories::RsvpRepository;
use crate::types::{EventError, EventResult};

#[derive(Clone)]
pub struct RsvpService {
    rsvps: Arc<dyn RsvpRepository>,
    notifications: NotificationService,
    guard: SubmissionGuard,
    grace: GraceWindow,
}

impl RsvpService {
    pub fn new(
        rsvps: Arc<dyn RsvpRepository>,
        notifications: NotificationService,
        grace: GraceWindow,
    ) -> Self {
        Self {
            rsvps,
            notifications,
            guard: SubmissionGuard::new(),
            grace,
        }
    }

    pub fn guard(&self) -> &SubmissionGuard {
        &self.guard
    }

    /// Most recent response matching the identity's email, if it has one.
    ///
    /// Advisory only: a concurrent submission from another session may land
    /// right after this returns `None`.
    pub async fn lookup_existing(
        &self,
        event: &Event,
        identity: Option<&Identity>,
    ) -> EventResult<Option<Rsvp>> {
        let Some(email) = identity.and_then(|identity| identity.email.as_deref()) else {
            return Ok(None);
        };
        self.rsvps.find_latest_rsvp(event.id, email).await
    }

    /// Start a form for `identity`, already confirmed when a response exists.
    pub async fn open_session(
        &self,
        event: &Event,
        identity: Option<&Identity>,
    ) -> EventResult<RsvpSession> {
        Ok(match self.lookup_existing(event, identity).await? {
            Some(existing) => {
                let link = self.calendar_link_for(event);
                RsvpSession::restored(existing, link)
            }
            None => RsvpSession::new(RsvpForm::prefilled(identity)),
        })
    }

    /// Submit the session's form.
    ///
    /// Local checks run first and leave the session untouched when they
    /// fail. The create call itself is the only uniqueness check; a store
    /// rejection is reported with its own message and the session returns
    /// to `NoResponse` so the guest can try again.
    pub async fn submit(
        &self,
        session: &mut RsvpSession,
        event: &Event,
        identity: Option<&Identity>,
    ) -> EventResult<()> {
        if session.is_confirmed() {
            return Ok(());
        }

        event.ensure_accepts_rsvps()?;
        let submission = session.form().normalize(identity)?;

        match self.lookup_existing(event, identity).await {
            Ok(Some(existing)) => {
                let link = self.calendar_link_for(event);
                session.confirm(existing, link);
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => warn!(event = %event.public_id, error = %err, "existing rsvp lookup failed"),
        }

        let _permit = self
            .guard
            .try_acquire(event.id, &submission.guest_email)
            .ok_or(EventError::SubmissionInProgress)?;
        session.begin_submit()?;

        match self.rsvps.create_rsvp(event.id, &submission).await {
            Ok(rsvp) => {
                info!(
                    event = %event.public_id,
                    rsvp = %rsvp.public_id,
                    status = rsvp.status.as_str(),
                    "rsvp recorded"
                );
                let link = self.calendar_link_for(event);
                session.confirm(rsvp, link);
                self.notifications.notify_rsvp_submitted(identity, event).await;
                Ok(())
            }
            Err(err) => {
                warn!(event = %event.public_id, error = %err, "rsvp submission rejected");
                session.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Every confirmed response gets an invite, whatever the answer.
    fn calendar_link_for(&self, event: &Event) -> Option<String> {
        Some(event_calendar_link(event, self.grace))
    }
}
