use std::fmt;

/// LogicalTime is a value read off a Lamport clock.
#[derive(Copy, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct LogicalTime(u64);

impl LogicalTime {
    pub fn new(time: u64) -> Self {
        LogicalTime(time)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// LamportClock is the per-process scalar logical clock.
///
/// Every event that a branch logs is stamped by exactly one call to `tick()`. A local event
/// (execute, final response) passes the clock's own current value as `received`, which collapses
/// the update rule to `local + 1`.
#[derive(Debug, Default)]
pub(crate) struct LamportClock {
    local: LogicalTime,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum ClockError {
    #[error("Lamport clock would overflow past {0:?}")]
    Overflow(LogicalTime),
}

impl LamportClock {
    pub(crate) fn new() -> Self {
        LamportClock::default()
    }

    pub(crate) fn now(&self) -> LogicalTime {
        self.local
    }

    /// `local = max(local, received) + 1`, stamped onto whatever `commit` records. The new value
    /// is only stored if `commit` accepts it, so a tick and the log append that records it are a
    /// single step. On overflow or a refused commit the clock does not move.
    pub(crate) fn tick<F, E>(&mut self, received: LogicalTime, commit: F) -> Result<LogicalTime, E>
    where
        F: FnOnce(LogicalTime) -> Result<(), E>,
        E: From<ClockError>,
    {
        let base = std::cmp::max(self.local, received);
        let next = base.0.checked_add(1).ok_or(ClockError::Overflow(base))?;
        commit(LogicalTime(next))?;
        self.local = LogicalTime(next);

        Ok(self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: u64) -> LogicalTime {
        LogicalTime::new(v)
    }

    fn tick(clock: &mut LamportClock, received: LogicalTime) -> Result<LogicalTime, ClockError> {
        clock.tick(received, |_| Ok(()))
    }

    fn tick_local(clock: &mut LamportClock) -> Result<LogicalTime, ClockError> {
        let now = clock.now();
        tick(clock, now)
    }

    #[test]
    fn tick_takes_max_plus_one() {
        let mut clock = LamportClock::new();
        assert_eq!(clock.now(), t(0));

        // Remote ahead of us.
        assert_eq!(tick(&mut clock, t(5)), Ok(t(6)));
        // Remote behind us.
        assert_eq!(tick(&mut clock, t(2)), Ok(t(7)));
        // Equal.
        assert_eq!(tick(&mut clock, t(7)), Ok(t(8)));
        // Local event.
        assert_eq!(tick_local(&mut clock), Ok(t(9)));
        assert_eq!(clock.now(), t(9));
    }

    #[test]
    fn tick_is_strictly_increasing() {
        let mut clock = LamportClock::new();
        let mut previous = clock.now();
        for received in vec![0, 3, 1, 1, 10, 4, 11, 11, 0] {
            let next = tick(&mut clock, t(received)).unwrap();
            assert!(next > previous, "{:?} is not after {:?}", next, previous);
            previous = next;
        }
    }

    #[test]
    fn rejected_commit_leaves_clock() {
        let mut clock = LamportClock::new();
        tick(&mut clock, t(3)).unwrap();

        let result = clock.tick(t(10), |candidate| {
            assert_eq!(candidate, t(11));
            Err(ClockError::Overflow(candidate))
        });
        assert!(result.is_err());
        assert_eq!(clock.now(), t(4));

        assert_eq!(tick(&mut clock, t(10)), Ok(t(11)));
    }

    #[test]
    fn tick_refuses_overflow() {
        let mut clock = LamportClock::new();
        assert_eq!(tick(&mut clock, t(u64::MAX)), Err(ClockError::Overflow(t(u64::MAX))));
        assert_eq!(clock.now(), t(0));

        assert_eq!(tick(&mut clock, t(u64::MAX - 1)), Ok(t(u64::MAX)));
        assert_eq!(tick_local(&mut clock), Err(ClockError::Overflow(t(u64::MAX))));
        assert_eq!(clock.now(), t(u64::MAX));
    }
}
