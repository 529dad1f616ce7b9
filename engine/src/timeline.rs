//! Virtual game clock with a single pending wake-up.
//!
//! The engine never sleeps. Every delay (card dwell, card gap, grab feedback,
//! round gap) is registered here as a [`Wake`] due at some point of game
//! time, and whoever drives the game advances the clock: tests call
//! [`crate::session::Game::advance`] directly, the async driver sleeps for
//! [`Timeline::time_until_next`] first.
//!
//! Only one wake-up can be pending. Scheduling a new one cancels the old one,
//! which is what keeps a round down to a single live card.

use std::time::Duration;

use serde::Serialize;

use crate::scoring::GrabOutcome;

/// What happens when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Wake {
    /// Begin the next round (or finish the game after the last one).
    StartRound,
    /// Dwell time of the live card ran out.
    HideCard,
    /// Gap after a hidden card ran out.
    ShowCard,
    /// Feedback pause after a grab ran out.
    GrabSettled(GrabOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub due: Duration,
    pub wake: Wake,
    pub generation: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    now: Duration,
    pending: Option<Pending>,
    generation: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Game time elapsed since the timeline was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    /// Register `wake` to fire `delay` from now, replacing any pending wake-up.
    pub fn schedule(&mut self, delay: Duration, wake: Wake) -> u64 {
        if let Some(old) = self.pending.take() {
            log::debug!("[TIMER] {:?} (gen {}) cancelled by {:?}", old.wake, old.generation, wake);
        }
        self.generation += 1;
        self.pending = Some(Pending {
            due: self.now + delay,
            wake,
            generation: self.generation,
        });
        self.generation
    }

    /// Drop the pending wake-up, if any.
    pub fn cancel(&mut self) -> Option<Pending> {
        self.pending.take()
    }

    /// Time left until the pending wake-up, `None` when idle.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.pending.map(|p| p.due.saturating_sub(self.now))
    }

    /// Pop the pending wake-up if it is due no later than `deadline`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Wake> {
        match self.pending {
            Some(p) if p.due <= deadline => {
                self.pending = None;
                self.now = self.now.max(p.due);
                Some(p.wake)
            }
            _ => None,
        }
    }

    /// Move the clock forward without firing anything.
    pub fn settle_at(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_schedule_replaces_pending() {
        let mut t = Timeline::new();
        let first = t.schedule(ms(3000), Wake::HideCard);
        let second = t.schedule(ms(500), Wake::GrabSettled(GrabOutcome::Correct));
        assert!(second > first);
        assert_eq!(t.time_until_next(), Some(ms(500)));
        assert_eq!(t.pop_due(ms(499)), None);
        assert_eq!(
            t.pop_due(ms(10_000)),
            Some(Wake::GrabSettled(GrabOutcome::Correct))
        );
        assert_eq!(t.now(), ms(500));
        assert_eq!(t.pop_due(ms(10_000)), None);
    }

    #[test]
    fn test_cancel_and_settle() {
        let mut t = Timeline::new();
        t.schedule(ms(1000), Wake::ShowCard);
        assert!(t.cancel().is_some());
        assert_eq!(t.time_until_next(), None);
        t.settle_at(ms(250));
        assert_eq!(t.now(), ms(250));
        t.schedule(ms(1000), Wake::ShowCard);
        assert_eq!(t.pending().map(|p| p.due), Some(ms(1250)));
    }
}
