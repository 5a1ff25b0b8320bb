use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (i64, String);

/// Tracks RSVP submissions currently in flight.
///
/// At most one submission per `(event, email)` runs at a time inside this
/// process. This only stops double clicks and retries from the same
/// deployment; uniqueness across processes is the store's job.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<Mutex<HashSet<Key>>>,
}

/// Held for the duration of one submission. Dropping it releases the key.
#[derive(Debug)]
pub struct SubmissionPermit {
    in_flight: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

fn lock(set: &Mutex<HashSet<Key>>) -> MutexGuard<'_, HashSet<Key>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another submission for the same key is running.
    pub fn try_acquire(&self, event_id: i64, email: &str) -> Option<SubmissionPermit> {
        let key = (event_id, email.to_lowercase());
        if !lock(&self.in_flight).insert(key.clone()) {
            return None;
        }
        Some(SubmissionPermit {
            in_flight: Arc::clone(&self.in_flight),
            key,
        })
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_waits_for_release() {
        let guard = SubmissionGuard::new();
        let permit = guard.try_acquire(1, "a@b.com").unwrap();
        assert!(guard.try_acquire(1, "A@B.com").is_none());
        assert!(guard.try_acquire(2, "a@b.com").is_some());
        drop(permit);
        assert!(guard.try_acquire(1, "a@b.com").is_some());
        assert_eq!(guard.in_flight(), 0);
    }
}
