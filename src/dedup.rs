// src/dedup.rs
//! Process-lifetime record of tickets that already triggered a job.
//!
//! Keys are `(platform, ticket_id)`. The set only grows: nothing expires and
//! nothing survives a restart.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::ticket::Platform;

#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<(Platform, String)>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership check only. Use [`Deduplicator::claim`] when acting on the
    /// answer, otherwise two concurrent callers can both see `true`.
    pub fn is_new(&self, platform: Platform, ticket_id: &str) -> bool {
        !self.seen.lock().contains(&(platform, ticket_id.to_string()))
    }

    /// Idempotent insert.
    pub fn mark_dispatched(&self, platform: Platform, ticket_id: &str) {
        self.seen.lock().insert((platform, ticket_id.to_string()));
    }

    /// Atomic check-and-mark: returns `true` for exactly one caller per key.
    pub fn claim(&self, platform: Platform, ticket_id: &str) -> bool {
        self.seen.lock().insert((platform, ticket_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn mark_then_check() {
        let d = Deduplicator::new();
        assert!(d.is_new(Platform::Jira, "NET-1"));
        d.mark_dispatched(Platform::Jira, "NET-1");
        d.mark_dispatched(Platform::Jira, "NET-1");
        assert!(!d.is_new(Platform::Jira, "NET-1"));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn keys_are_scoped_by_platform() {
        let d = Deduplicator::new();
        assert!(d.claim(Platform::ServiceNow, "42"));
        assert!(d.is_new(Platform::Jira, "42"));
        assert!(d.claim(Platform::Jira, "42"));
        assert!(!d.claim(Platform::ServiceNow, "42"));
    }

    #[test]
    fn claim_is_exclusive_across_threads() {
        let d = Arc::new(Deduplicator::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let d = d.clone();
                std::thread::spawn(move || d.claim(Platform::ServiceNow, "INC0010001"))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }
}
