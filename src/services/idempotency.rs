use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::dto::draft_dto::ActionType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionKey {
    pub match_id: i64,
    pub actor_id: String,
    pub champion_id: i64,
    pub action: ActionType,
}

/// Bounded-lifetime idempotency set. A submission repeated with the same
/// key inside the window is absorbed as a no-op success.
#[derive(Debug)]
pub struct IdempotencyWindow {
    window: Duration,
    seen: HashMap<SubmissionKey, Instant>,
}

impl IdempotencyWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Evicts expired keys, then reports whether `key` was committed inside
    /// the window.
    pub fn is_duplicate(&mut self, key: &SubmissionKey) -> bool {
        let window = self.window;
        self.seen.retain(|_, at| at.elapsed() < window);
        self.seen.contains_key(key)
    }

    pub fn record(&mut self, key: SubmissionKey) {
        self.seen.insert(key, Instant::now());
    }

    /// Drops every key for a match. Called when an edit rewinds the session,
    /// since the rewound slots make previously committed keys submittable
    /// again.
    pub fn evict_match(&mut self, match_id: i64) {
        self.seen.retain(|key, _| key.match_id != match_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(champion_id: i64) -> SubmissionKey {
        SubmissionKey {
            match_id: 1,
            actor_id: "p0".to_string(),
            champion_id,
            action: ActionType::Ban,
        }
    }

    #[test]
    fn repeat_inside_window_is_duplicate() {
        let mut window = IdempotencyWindow::new(Duration::from_secs(5));
        assert!(!window.is_duplicate(&key(64)));
        window.record(key(64));
        assert!(window.is_duplicate(&key(64)));
        assert!(!window.is_duplicate(&key(103)));
    }

    #[test]
    fn evicting_a_match_only_touches_its_keys() {
        let mut window = IdempotencyWindow::new(Duration::from_secs(5));
        window.record(key(64));
        window.record(SubmissionKey { match_id: 2, ..key(64) });
        window.evict_match(1);
        assert!(!window.is_duplicate(&key(64)));
        assert!(window.is_duplicate(&SubmissionKey { match_id: 2, ..key(64) }));
    }

    #[test]
    fn keys_expire_after_the_window() {
        let mut window = IdempotencyWindow::new(Duration::from_millis(10));
        window.record(key(64));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!window.is_duplicate(&key(64)));
    }
}
