use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dewana_auth::Identity;

use crate::types::{EventError, EventResult};
use crate::utils::{non_empty, Validator};

pub const MIN_GUEST_COUNT: u8 = 1;
pub const MAX_GUEST_COUNT: u8 = 10;

/// Attendance answer enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    #[default]
    Yes,
    No,
    Maybe,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Yes => "yes",
            RsvpStatus::No => "no",
            RsvpStatus::Maybe => "maybe",
        }
    }
}

impl From<&str> for RsvpStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "no" => RsvpStatus::No,
            "maybe" => RsvpStatus::Maybe,
            _ => RsvpStatus::Yes,
        }
    }
}

impl From<RsvpStatus> for String {
    fn from(status: RsvpStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A guest's recorded response. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rsvp {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    #[serde(skip)]
    pub event_id: i64,
    pub guest_name: String,
    /// Always lower case
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub status: RsvpStatus,
    /// Present only for `yes`
    pub guest_count: Option<u8>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// The RSVP form as a guest fills it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsvpForm {
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub status: RsvpStatus,
    #[serde(alias = "num_guests")]
    pub guest_count: Option<i64>,
    pub message: Option<String>,
}

impl RsvpForm {
    /// Blank form with the name and email taken from the identity.
    pub fn prefilled(identity: Option<&Identity>) -> Self {
        Self {
            guest_name: identity
                .and_then(|identity| identity.display_name.clone())
                .unwrap_or_default(),
            guest_email: identity
                .and_then(|identity| identity.email.clone())
                .unwrap_or_default(),
            guest_count: Some(i64::from(MIN_GUEST_COUNT)),
            ..Self::default()
        }
    }

    /// Validate and normalise the form into the payload sent to the store.
    ///
    /// An identity carrying an email overrides the typed email. Emails are
    /// lower-cased; the guest count is kept only for `yes` and clamped.
    pub fn normalize(&self, identity: Option<&Identity>) -> EventResult<RsvpSubmission> {
        let email = identity
            .and_then(|identity| identity.email.as_deref())
            .unwrap_or(&self.guest_email);
        let guest_email = email.trim().to_lowercase();
        Validator::email(&guest_email)?;

        let guest_name = non_empty(Some(self.guest_name.clone()))
            .or_else(|| non_empty(identity.and_then(|identity| identity.display_name.clone())))
            .ok_or_else(|| EventError::validation("Name is required"))?;
        Validator::required_text("Name", &guest_name, 255)?;

        let guest_phone = non_empty(self.guest_phone.clone());
        Validator::optional_text("Phone", guest_phone.as_deref(), 32)?;

        let message = non_empty(self.message.clone());
        Validator::optional_text("Message", message.as_deref(), 2_000)?;

        let guest_count = match self.status {
            RsvpStatus::Yes => Some(clamp_guest_count(self.guest_count)),
            RsvpStatus::No | RsvpStatus::Maybe => None,
        };

        Ok(RsvpSubmission {
            guest_name,
            guest_email,
            guest_phone,
            status: self.status,
            guest_count,
            message,
        })
    }
}

fn clamp_guest_count(count: Option<i64>) -> u8 {
    let clamped = count
        .unwrap_or(i64::from(MIN_GUEST_COUNT))
        .clamp(i64::from(MIN_GUEST_COUNT), i64::from(MAX_GUEST_COUNT));
    u8::try_from(clamped).unwrap_or(MIN_GUEST_COUNT)
}

/// Normalised fields handed to the atomic create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpSubmission {
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub status: RsvpStatus,
    pub guest_count: Option<u8>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpFormState {
    NoResponse,
    Submitting,
    Confirmed,
}

/// State of one RSVP form instance.
///
/// `NoResponse -> Submitting -> Confirmed`, falling back to `NoResponse`
/// when a submission fails. A session restored from an existing response
/// starts out `Confirmed`.
#[derive(Debug, Clone, Serialize)]
pub struct RsvpSession {
    state: RsvpFormState,
    form: RsvpForm,
    response: Option<Rsvp>,
    calendar_link: Option<String>,
    last_error: Option<String>,
}

impl RsvpSession {
    pub fn new(form: RsvpForm) -> Self {
        Self {
            state: RsvpFormState::NoResponse,
            form,
            response: None,
            calendar_link: None,
            last_error: None,
        }
    }

    pub fn restored(response: Rsvp, calendar_link: Option<String>) -> Self {
        let form = RsvpForm {
            guest_name: response.guest_name.clone(),
            guest_email: response.guest_email.clone(),
            guest_phone: response.guest_phone.clone(),
            status: response.status,
            guest_count: response.guest_count.map(i64::from),
            message: response.message.clone(),
        };
        Self {
            state: RsvpFormState::Confirmed,
            form,
            response: Some(response),
            calendar_link,
            last_error: None,
        }
    }

    pub fn state(&self) -> RsvpFormState {
        self.state
    }

    pub fn form(&self) -> &RsvpForm {
        &self.form
    }

    pub fn response(&self) -> Option<&Rsvp> {
        self.response.as_ref()
    }

    pub fn calendar_link(&self) -> Option<&str> {
        self.calendar_link.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == RsvpFormState::Confirmed
    }

    /// Replace the form contents; only possible before a response exists.
    pub fn edit_form(&mut self, form: RsvpForm) -> EventResult<()> {
        match self.state {
            RsvpFormState::NoResponse => {
                self.form = form;
                Ok(())
            }
            RsvpFormState::Submitting => Err(EventError::SubmissionInProgress),
            RsvpFormState::Confirmed => Err(EventError::RsvpAlreadyExists),
        }
    }

    /// Enter `Submitting`. Fails while another attempt is in flight.
    pub fn begin_submit(&mut self) -> EventResult<()> {
        match self.state {
            RsvpFormState::NoResponse => {
                self.state = RsvpFormState::Submitting;
                self.last_error = None;
                Ok(())
            }
            RsvpFormState::Submitting => Err(EventError::SubmissionInProgress),
            RsvpFormState::Confirmed => Err(EventError::RsvpAlreadyExists),
        }
    }

    pub fn confirm(&mut self, response: Rsvp, calendar_link: Option<String>) {
        self.state = RsvpFormState::Confirmed;
        self.response = Some(response);
        self.calendar_link = calendar_link;
        self.last_error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = RsvpFormState::NoResponse;
        self.last_error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: Option<&str>, name: Option<&str>) -> Identity {
        Identity {
            user_id: 9,
            public_id: "user-9".into(),
            email: email.map(str::to_owned),
            display_name: name.map(str::to_owned),
        }
    }

    fn form() -> RsvpForm {
        RsvpForm {
            guest_name: "Meera".into(),
            guest_email: "A@B.COM".into(),
            guest_phone: Some(" ".into()),
            status: RsvpStatus::Yes,
            guest_count: Some(3),
            message: Some("See you there".into()),
        }
    }

    #[test]
    fn email_is_lower_cased() {
        let submission = form().normalize(None).unwrap();
        assert_eq!(submission.guest_email, "a@b.com");
        assert_eq!(submission.guest_phone, None);
        assert_eq!(submission.guest_count, Some(3));
    }

    #[test]
    fn identity_email_overrides_form() {
        let who = identity(Some("Meera@Example.com"), None);
        let submission = form().normalize(Some(&who)).unwrap();
        assert_eq!(submission.guest_email, "meera@example.com");
    }

    #[test]
    fn identity_without_email_uses_form_email() {
        let who = identity(None, Some("Meera K"));
        let mut blank_name = form();
        blank_name.guest_name = "  ".into();
        let submission = blank_name.normalize(Some(&who)).unwrap();
        assert_eq!(submission.guest_email, "a@b.com");
        assert_eq!(submission.guest_name, "Meera K");
    }

    #[test]
    fn guest_count_is_clamped_for_yes() {
        for (input, expected) in [
            (None, 1),
            (Some(0), 1),
            (Some(-4), 1),
            (Some(1), 1),
            (Some(10), 10),
            (Some(11), 10),
            (Some(i64::MAX), 10),
        ] {
            let mut yes = form();
            yes.guest_count = input;
            assert_eq!(yes.normalize(None).unwrap().guest_count, Some(expected));
        }
    }

    #[test]
    fn guest_count_dropped_unless_yes() {
        for status in [RsvpStatus::No, RsvpStatus::Maybe] {
            let mut other = form();
            other.status = status;
            other.guest_count = Some(99);
            let submission = other.normalize(None).unwrap();
            assert_eq!(submission.guest_count, None);
            assert_eq!(submission.status, status);
        }
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut no_email = form();
        no_email.guest_email = String::new();
        assert!(matches!(
            no_email.normalize(None),
            Err(EventError::Validation { .. })
        ));

        let mut no_name = form();
        no_name.guest_name = String::new();
        assert!(no_name.normalize(None).is_err());
    }

    #[test]
    fn form_accepts_num_guests_alias() {
        let parsed: RsvpForm = serde_json::from_str(
            r#"{"guest_name":"A","guest_email":"a@b.com","status":"maybe","num_guests":4}"#,
        )
        .unwrap();
        assert_eq!(parsed.guest_count, Some(4));
        assert_eq!(parsed.status, RsvpStatus::Maybe);
    }

    #[test]
    fn prefill_uses_identity() {
        let who = identity(Some("guest@example.com"), Some("Guest"));
        let prefilled = RsvpForm::prefilled(Some(&who));
        assert_eq!(prefilled.guest_email, "guest@example.com");
        assert_eq!(prefilled.guest_name, "Guest");
        assert_eq!(RsvpForm::prefilled(None).guest_email, "");
    }

    #[test]
    fn session_transitions() {
        let mut session = RsvpSession::new(form());
        assert_eq!(session.state(), RsvpFormState::NoResponse);

        session.begin_submit().unwrap();
        assert_eq!(session.state(), RsvpFormState::Submitting);
        assert!(matches!(
            session.begin_submit(),
            Err(EventError::SubmissionInProgress)
        ));

        session.fail("network down");
        assert_eq!(session.state(), RsvpFormState::NoResponse);
        assert_eq!(session.last_error(), Some("network down"));

        session.begin_submit().unwrap();
        assert!(session.last_error().is_none());
        let response = Rsvp {
            id: 1,
            public_id: "r1".into(),
            event_id: 1,
            guest_name: "Meera".into(),
            guest_email: "a@b.com".into(),
            guest_phone: None,
            status: RsvpStatus::Yes,
            guest_count: Some(3),
            message: None,
            submitted_at: Utc::now(),
        };
        session.confirm(response.clone(), Some("https://calendar".into()));
        assert!(session.is_confirmed());
        assert_eq!(session.response(), Some(&response));
        assert!(matches!(session.begin_submit(), Err(EventError::RsvpAlreadyExists)));
        assert!(session.edit_form(form()).is_err());
    }

    #[test]
    fn restored_session_is_confirmed() {
        let response = Rsvp {
            id: 2,
            public_id: "r2".into(),
            event_id: 1,
            guest_name: "Dev".into(),
            guest_email: "dev@example.com".into(),
            guest_phone: None,
            status: RsvpStatus::Maybe,
            guest_count: None,
            message: None,
            submitted_at: Utc::now(),
        };
        let session = RsvpSession::restored(response, None);
        assert!(session.is_confirmed());
        assert_eq!(session.form().status, RsvpStatus::Maybe);
        assert_eq!(session.form().guest_email, "dev@example.com");
    }
}
