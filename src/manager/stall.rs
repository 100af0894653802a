use std::time::{Duration, Instant};

/// Delay-based stall detection for one burst of searches.
///
/// Armed by the first dispatch of a burst, the timer fires at most once and is
/// only reset once every in-flight request has resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StallTimer {
    #[default]
    Idle,
    Armed {
        deadline: Instant,
    },
    Fired,
}

impl StallTimer {
    /// Arm the timer for a search dispatched at `at`.
    ///
    /// Returns `false` when a timer is already pending for the current burst.
    pub fn arm(&mut self, at: Instant, delay: Duration) -> bool {
        if !matches!(self, Self::Idle) {
            return false;
        }
        *self = Self::Armed {
            deadline: at + delay,
        };
        true
    }

    /// Advance to `now`. Returns `true` exactly when the deadline passes.
    pub fn tick(&mut self, now: Instant) -> bool {
        match *self {
            Self::Armed { deadline } if now >= deadline => {
                *self = Self::Fired;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Idle;
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Armed { deadline } => Some(*deadline),
            Self::Idle | Self::Fired => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(200);

    #[test]
    fn fires_once_after_the_deadline() {
        let start = Instant::now();
        let mut timer = StallTimer::default();
        assert!(timer.arm(start, DELAY));

        assert!(!timer.tick(start + Duration::from_millis(199)));
        assert!(timer.tick(start + DELAY));
        assert!(!timer.tick(start + DELAY * 3));
        assert_eq!(timer, StallTimer::Fired);
    }

    #[test]
    fn a_pending_timer_is_not_rearmed() {
        let start = Instant::now();
        let mut timer = StallTimer::default();
        timer.arm(start, DELAY);

        assert!(!timer.arm(start + Duration::from_millis(150), DELAY));
        assert_eq!(timer.deadline(), Some(start + DELAY));

        timer.tick(start + DELAY);
        assert!(!timer.arm(start + DELAY, DELAY));
    }

    #[test]
    fn clearing_starts_a_new_burst() {
        let start = Instant::now();
        let mut timer = StallTimer::default();
        timer.arm(start, DELAY);
        timer.clear();

        assert!(timer.is_idle());
        assert!(!timer.tick(start + DELAY));
        assert!(timer.arm(start + DELAY, DELAY));
    }
}
