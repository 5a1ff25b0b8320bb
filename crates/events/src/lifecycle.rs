//! Event lifecycle status.
//!
//! The status shown to viewers is derived from an event's start, optional end
//! and the current time. Nothing is persisted: callers re-derive it whenever
//! they need a fresh value, either directly through [`derive_status`] or by
//! subscribing to [`status_updates`].

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::time::{self, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Upcoming,
    Live,
    Completed,
}

impl LifecycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Upcoming => "Upcoming",
            LifecycleStatus::Live => "Live",
            LifecycleStatus::Completed => "Completed",
        }
    }

    /// No later instant can produce a different status.
    pub fn is_final(self) -> bool {
        matches!(self, LifecycleStatus::Completed)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long an event without a declared end stays live after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceWindow(Duration);

impl GraceWindow {
    /// Returns `None` for a zero or unrepresentable duration.
    pub fn new(duration: StdDuration) -> Option<Self> {
        if duration.is_zero() {
            return None;
        }
        Duration::from_std(duration).ok().map(Self)
    }

    pub fn from_hours(hours: u64) -> Option<Self> {
        Self::new(StdDuration::from_secs(hours.checked_mul(3_600)?))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

/// Derive the lifecycle status at `now`.
///
/// Upcoming before `start`, live from `start` (inclusive) until the end
/// (inclusive), completed afterwards. Without an end the event closes once
/// `grace` has elapsed after `start`.
pub fn derive_status(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    grace: GraceWindow,
) -> LifecycleStatus {
    if now < start {
        return LifecycleStatus::Upcoming;
    }

    let closes_at = end.unwrap_or_else(|| {
        start
            .checked_add_signed(grace.as_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });

    if now <= closes_at {
        LifecycleStatus::Live
    } else {
        LifecycleStatus::Completed
    }
}

/// The timestamps status derivation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchedule {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl EventSchedule {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn status_at(&self, now: DateTime<Utc>, grace: GraceWindow) -> LifecycleStatus {
        derive_status(self.start, self.end, now, grace)
    }

    /// Last instant at which the event still counts as live.
    pub fn closes_at(&self, grace: GraceWindow) -> DateTime<Utc> {
        self.end.unwrap_or_else(|| {
            self.start
                .checked_add_signed(grace.as_duration())
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }
}

/// Re-derive the status every `period` while the stream is polled.
///
/// The first item is the status at subscription time. After that only
/// changes are yielded, and the stream ends once `Completed` was emitted.
pub fn status_updates<C>(
    schedule: EventSchedule,
    grace: GraceWindow,
    period: StdDuration,
    clock: C,
) -> impl Stream<Item = LifecycleStatus> + Send + 'static
where
    C: Fn() -> DateTime<Utc> + Send + Sync + 'static,
{
    let initial: (Option<Interval>, C, Option<LifecycleStatus>) = (None, clock, None);

    stream::unfold(initial, move |(ticker, clock, last)| async move {
        if last.is_some_and(LifecycleStatus::is_final) {
            return None;
        }

        let mut ticker = ticker.unwrap_or_else(|| {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            ticker.tick().await;
            let status = schedule.status_at(clock(), grace);
            if last != Some(status) {
                return Some((status, (Some(ticker), clock, Some(status))));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-10T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn three_hours() -> GraceWindow {
        GraceWindow::from_hours(3).unwrap()
    }

    #[test]
    fn grace_window_rejects_zero() {
        assert!(GraceWindow::new(StdDuration::ZERO).is_none());
        assert!(GraceWindow::from_hours(0).is_none());
        assert_eq!(
            GraceWindow::from_hours(2).unwrap().as_duration(),
            Duration::hours(2)
        );
    }

    #[test]
    fn with_end_every_region_of_the_timeline() {
        let start = t0();
        let end = start + Duration::hours(5);
        let grace = three_hours();

        let cases = [
            (start - Duration::days(3), LifecycleStatus::Upcoming),
            (start - Duration::seconds(1), LifecycleStatus::Upcoming),
            (start, LifecycleStatus::Live),
            (start + Duration::hours(4), LifecycleStatus::Live),
            (end, LifecycleStatus::Live),
            (end + Duration::seconds(1), LifecycleStatus::Completed),
            (end + Duration::days(30), LifecycleStatus::Completed),
        ];

        for (now, expected) in cases {
            assert_eq!(derive_status(start, Some(end), now, grace), expected, "at {now}");
        }
    }

    #[test]
    fn declared_end_overrides_grace_window() {
        let start = t0();
        let end = start + Duration::hours(10);
        let now = start + Duration::hours(6);
        assert_eq!(
            derive_status(start, Some(end), now, three_hours()),
            LifecycleStatus::Live
        );
    }

    #[test]
    fn without_end_live_for_grace_window() {
        let start = t0();
        let grace = three_hours();

        assert_eq!(
            derive_status(start, None, start + Duration::hours(1), grace),
            LifecycleStatus::Live
        );
        assert_eq!(
            derive_status(start, None, start + Duration::hours(3), grace),
            LifecycleStatus::Live
        );
        assert_eq!(
            derive_status(start, None, start + Duration::hours(4), grace),
            LifecycleStatus::Completed
        );
    }

    #[test]
    fn start_instant_is_live() {
        let start = t0();
        assert_eq!(derive_status(start, None, start, three_hours()), LifecycleStatus::Live);
        assert_eq!(
            derive_status(start, Some(start), start, three_hours()),
            LifecycleStatus::Live
        );
    }

    #[test]
    fn huge_grace_window_saturates() {
        // roughly 285k years, past the largest representable date
        let grace = GraceWindow::new(StdDuration::from_secs(9_000_000_000_000)).unwrap();
        assert_eq!(
            derive_status(t0(), None, t0() + Duration::days(365), grace),
            LifecycleStatus::Live
        );
    }

    #[test]
    fn schedule_closes_at_prefers_end() {
        let schedule = EventSchedule::new(t0(), None);
        assert_eq!(schedule.closes_at(three_hours()), t0() + Duration::hours(3));
        let schedule = EventSchedule::new(t0(), Some(t0() + Duration::hours(1)));
        assert_eq!(schedule.closes_at(three_hours()), t0() + Duration::hours(1));
    }

    #[tokio::test(start_paused = true)]
    async fn updates_follow_the_clock_until_completed() {
        let base = time::Instant::now();
        let epoch = t0();
        let clock = move || {
            let elapsed = time::Instant::now().duration_since(base);
            epoch + Duration::from_std(elapsed).unwrap()
        };

        let schedule = EventSchedule::new(
            epoch + Duration::seconds(90),
            Some(epoch + Duration::seconds(150)),
        );

        let seen: Vec<_> = status_updates(
            schedule,
            three_hours(),
            StdDuration::from_secs(30),
            clock,
        )
        .collect()
        .await;

        assert_eq!(
            seen,
            vec![
                LifecycleStatus::Upcoming,
                LifecycleStatus::Live,
                LifecycleStatus::Completed
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completed_event_yields_once() {
        let epoch = t0();
        let schedule = EventSchedule::new(epoch - Duration::days(2), None);
        let seen: Vec<_> = status_updates(
            schedule,
            three_hours(),
            StdDuration::from_secs(30),
            move || epoch,
        )
        .collect()
        .await;

        assert_eq!(seen, vec![LifecycleStatus::Completed]);
    }
}
