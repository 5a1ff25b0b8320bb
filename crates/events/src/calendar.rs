//! "Add to calendar" links.

use chrono::{DateTime, Utc};

use crate::entities::Event;
use crate::lifecycle::GraceWindow;

const GOOGLE_CALENDAR_BASE: &str = "https://calendar.google.com/calendar/render?action=TEMPLATE";

fn calendar_stamp(value: DateTime<Utc>) -> String {
    value.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Google Calendar template link.
pub fn calendar_link(
    title: &str,
    description: &str,
    location: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "{GOOGLE_CALENDAR_BASE}&text={}&dates={}/{}&details={}&location={}",
        urlencoding::encode(title),
        calendar_stamp(start),
        calendar_stamp(end),
        urlencoding::encode(description),
        urlencoding::encode(location),
    )
}

/// Calendar link for an event. Events without an end span the grace window.
pub fn event_calendar_link(event: &Event, grace: GraceWindow) -> String {
    calendar_link(
        &event.event_name,
        event.description.as_deref().unwrap_or_default(),
        &event.location_label(),
        event.start_date,
        event.schedule().closes_at(grace),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_template_link() {
        let start = DateTime::parse_from_rfc3339("2025-11-20T17:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end = DateTime::parse_from_rfc3339("2025-11-20T22:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let link = calendar_link("Asha & Ravi", "Dinner, dancing", "Lotus Hall", start, end);
        assert_eq!(
            link,
            "https://calendar.google.com/calendar/render?action=TEMPLATE\
             &text=Asha%20%26%20Ravi\
             &dates=20251120T173000Z/20251120T220000Z\
             &details=Dinner%2C%20dancing\
             &location=Lotus%20Hall"
        );
    }
}
