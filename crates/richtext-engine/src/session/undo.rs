use std::time::{Duration, Instant};

/// A single rescheduled deadline for the next undo checkpoint.
#[derive(Debug, Clone)]
pub struct UndoDebounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl UndoDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Push the deadline to `now + delay`, replacing any pending one.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has passed. A due deadline is cleared.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut debounce = UndoDebounce::new(Duration::from_millis(1000));
        debounce.schedule(start);

        assert!(!debounce.take_due(start + Duration::from_millis(999)));
        assert!(debounce.take_due(start + Duration::from_millis(1000)));
        assert!(!debounce.take_due(start + Duration::from_millis(2000)));
    }

    #[test]
    fn rescheduling_moves_deadline() {
        let start = Instant::now();
        let mut debounce = UndoDebounce::new(Duration::from_millis(1000));
        debounce.schedule(start);
        debounce.schedule(start + Duration::from_millis(600));

        assert!(!debounce.take_due(start + Duration::from_millis(1200)));
        assert!(debounce.take_due(start + Duration::from_millis(1600)));
    }

    #[test]
    fn cancel_clears() {
        let start = Instant::now();
        let mut debounce = UndoDebounce::new(Duration::from_millis(10));
        debounce.schedule(start);
        debounce.cancel();
        assert_eq!(debounce.deadline(), None);
        assert!(!debounce.take_due(start + Duration::from_secs(1)));
    }
}
