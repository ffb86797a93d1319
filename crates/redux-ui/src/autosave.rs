//! Debounced autosave.
//!
//! Every accepted patch pushes the deadline out by the full delay, so a burst
//! of edits ends in a single save. The scheduler only tracks time; the
//! controller owns the session and performs the save when the deadline is due.

use redux_settings::EditorSettings;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    delay: Duration,
    state: AutosaveState,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: AutosaveState::Idle,
        }
    }

    pub fn from_settings(settings: &EditorSettings) -> Self {
        Self::new(Duration::from_millis(settings.autosave_delay_ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            AutosaveState::Idle => None,
            AutosaveState::Armed { deadline } => Some(deadline),
        }
    }

    /// Replace any pending deadline with `now + delay`.
    pub fn arm(&mut self) -> Instant {
        let deadline = Instant::now() + self.delay;
        self.state = AutosaveState::Armed { deadline };
        deadline
    }

    pub fn disarm(&mut self) {
        self.state = AutosaveState::Idle;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.state, AutosaveState::Armed { deadline } if now >= deadline)
    }

    /// Go back to idle if the deadline has passed. Returns whether a save
    /// should run now.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.state = AutosaveState::Idle;
            true
        } else {
            false
        }
    }
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::from_settings(&EditorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn deadline_follows_the_last_arm() {
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(5000));
        assert_eq!(scheduler.state(), AutosaveState::Idle);

        let first = scheduler.arm();
        advance(Duration::from_millis(3000)).await;
        let second = scheduler.arm();
        assert_eq!(second - first, Duration::from_millis(3000));

        advance(Duration::from_millis(4999)).await;
        assert!(!scheduler.take_due(Instant::now()));
        advance(Duration::from_millis(1)).await;
        assert!(scheduler.take_due(Instant::now()));
        assert_eq!(scheduler.state(), AutosaveState::Idle);
        assert!(!scheduler.take_due(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_cancels_pending_save() {
        let mut scheduler = AutosaveScheduler::new(Duration::from_millis(10));
        scheduler.arm();
        scheduler.disarm();
        advance(Duration::from_millis(50)).await;
        assert!(!scheduler.is_due(Instant::now()));
        assert_eq!(scheduler.deadline(), None);
    }

    #[test]
    fn default_delay_is_five_seconds() {
        assert_eq!(AutosaveScheduler::default().delay(), Duration::from_millis(5000));
    }
}
