use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_SELECTION_TIME: Duration = Duration::from_secs(30);

/// Client-local advisory countdown for an open selection flow. Reaching
/// zero closes the flow without submitting; it carries no authority over
/// commits.
#[derive(Debug)]
pub struct SelectionTimer {
    duration: Duration,
    deadline: Option<Instant>,
}

impl SelectionTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// (Re)starts the countdown; called whenever a selection flow opens.
    pub fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.duration);
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Default for SelectionTimer {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTION_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expires_only_after_the_configured_duration() {
        let mut timer = SelectionTimer::new(Duration::from_secs(30));
        assert!(!timer.running());
        assert!(!timer.expired());

        timer.start();
        assert!(timer.running());
        assert!(!timer.expired());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!timer.expired());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(timer.expired());
        assert_eq!(timer.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_the_deadline() {
        let mut timer = SelectionTimer::new(Duration::from_secs(30));
        timer.start();
        tokio::time::advance(Duration::from_secs(20)).await;
        timer.start();
        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!timer.expired());

        timer.clear();
        assert!(!timer.running());
        assert!(!timer.expired());
    }
}
