//! Fetch gate: at most one photo search per cooldown window
//!
//! Two states, `Allowed` and `Blocked { until }`. Acquiring in `Allowed` arms
//! the cooldown; the gate reads as `Allowed` again as soon as the deadline has
//! passed, without anyone having to fire a timer. The gate is owned by the
//! pipeline actor and is never shared across tasks.

use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Allowed,
    /// `until: None` when the cooldown ends beyond what `Instant` can represent;
    /// the gate then stays blocked for the life of the process.
    Blocked { until: Option<Instant> },
}

/// Debounce/cooldown gate for photo searches
#[derive(Debug)]
pub struct FetchGate {
    cooldown: Duration,
    state: GateState,
}

impl FetchGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: GateState::Allowed,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Take the fetch permission if it is available now
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Take the fetch permission if it is available at `now`
    ///
    /// Returns `true` and arms a cooldown ending at `now + cooldown`, or
    /// `false` with no side effects while a cooldown is pending.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        match self.state_at(now) {
            GateState::Allowed => {
                let until = now.checked_add(self.cooldown);
                if until.is_none() {
                    warn!(
                        cooldown_secs = self.cooldown.as_secs(),
                        "Cooldown out of range, photo fetch stays disabled"
                    );
                }
                self.state = GateState::Blocked { until };
                true
            }
            GateState::Blocked { .. } => false,
        }
    }

    /// State as observed at `now`
    pub fn state_at(&self, now: Instant) -> GateState {
        match self.state {
            GateState::Blocked { until: Some(until) } if now >= until => GateState::Allowed,
            state => state,
        }
    }

    /// Deadline of the pending cooldown, if one is armed and not yet observed as expired
    pub fn reopens_at(&self) -> Option<Instant> {
        match self.state {
            GateState::Blocked { until } => until,
            GateState::Allowed => None,
        }
    }

    /// Record that the pending cooldown has expired
    ///
    /// Returns `true` if a cooldown was actually cleared. Calling this before
    /// the deadline is a no-op.
    pub fn expire_at(&mut self, now: Instant) -> bool {
        match self.state {
            GateState::Blocked { until: Some(until) } if now >= until => {
                self.state = GateState::Allowed;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(15);

    #[test]
    fn test_starts_allowed() {
        let gate = FetchGate::new(COOLDOWN);
        assert_eq!(gate.state_at(Instant::now()), GateState::Allowed);
        assert!(gate.reopens_at().is_none());
    }

    #[test]
    fn test_cooldown_scenario() {
        let t0 = Instant::now();
        let mut gate = FetchGate::new(COOLDOWN);

        // t=0: request fires, gate blocks
        assert!(gate.try_acquire_at(t0));
        assert_eq!(
            gate.state_at(t0),
            GateState::Blocked {
                until: Some(t0 + COOLDOWN)
            }
        );

        // t=5: denied
        let t5 = t0 + Duration::from_secs(5);
        assert!(!gate.try_acquire_at(t5));
        assert_eq!(gate.reopens_at(), Some(t0 + COOLDOWN), "denial must not re-arm");

        // t=15: allowed again
        let t15 = t0 + COOLDOWN;
        assert_eq!(gate.state_at(t15), GateState::Allowed);
        assert!(gate.try_acquire_at(t15));
        assert_eq!(gate.reopens_at(), Some(t15 + COOLDOWN));
    }

    #[test]
    fn test_burst_within_window_acquires_once() {
        let t0 = Instant::now();
        let mut gate = FetchGate::new(COOLDOWN);

        let granted = (0..50)
            .map(|i| t0 + Duration::from_millis(i * 250))
            .filter(|&t| gate.try_acquire_at(t))
            .count();

        assert_eq!(granted, 1);
    }

    #[test]
    fn test_expire_before_deadline_is_noop() {
        let t0 = Instant::now();
        let mut gate = FetchGate::new(COOLDOWN);
        gate.try_acquire_at(t0);

        assert!(!gate.expire_at(t0 + Duration::from_secs(14)));
        assert!(gate.reopens_at().is_some());

        assert!(gate.expire_at(t0 + COOLDOWN));
        assert!(gate.reopens_at().is_none());
        assert!(!gate.expire_at(t0 + COOLDOWN), "nothing left to expire");
    }

    #[test]
    fn test_zero_cooldown_always_allows() {
        let t0 = Instant::now();
        let mut gate = FetchGate::new(Duration::ZERO);
        assert!(gate.try_acquire_at(t0));
        assert!(gate.try_acquire_at(t0));
    }

    #[test]
    fn test_unrepresentable_cooldown_blocks_without_panicking() {
        let t0 = Instant::now();
        let mut gate = FetchGate::new(Duration::from_secs(u64::MAX));

        assert!(gate.try_acquire_at(t0));
        assert_eq!(gate.state_at(t0), GateState::Blocked { until: None });
        assert!(gate.reopens_at().is_none(), "no deadline to sleep until");

        let much_later = t0 + Duration::from_secs(365 * 24 * 3600);
        assert!(!gate.try_acquire_at(much_later));
        assert!(!gate.expire_at(much_later));
    }
}
