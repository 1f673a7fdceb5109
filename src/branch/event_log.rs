use crate::api::Interface;
use crate::branch::clock::LogicalTime;
use crate::branch::peers::OriginatorId;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    Request,
    Execute,
    Response,
}

/// EventName names a lifecycle step, e.g. `deposit_propagate_request`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct EventName {
    pub(crate) interface: Interface,
    pub(crate) phase: Phase,
}

impl EventName {
    pub(crate) fn new(interface: Interface, phase: Phase) -> Self {
        EventName { interface, phase }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Request => "request",
            Phase::Execute => "execute",
            Phase::Response => "response",
        };
        write!(f, "{}_{}", self.interface, phase)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BranchLogEntry {
    pub(crate) originator_id: OriginatorId,
    pub(crate) event: EventName,
    pub(crate) clock: LogicalTime,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OriginatorEvent {
    pub(crate) clock: LogicalTime,
    pub(crate) event: EventName,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum EventLogError {
    #[error("Clock regression: attempted to log {attempted:?} after {previous:?}")]
    ClockRegression {
        previous: LogicalTime,
        attempted: LogicalTime,
    },
}

/// EventLog is a branch's append-only record of every step it executed.
///
/// Each append lands in two views: the branch log (this branch's total order of steps) and the
/// per-originator log (the slice of a causal chain that passed through this branch). Clocks in the
/// branch log are strictly increasing; an append that would break that is refused.
#[derive(Debug, Default)]
pub(crate) struct EventLog {
    branch_log: Vec<BranchLogEntry>,
    by_originator: BTreeMap<OriginatorId, Vec<OriginatorEvent>>,
}

impl EventLog {
    pub(crate) fn new() -> Self {
        EventLog::default()
    }

    pub(crate) fn append(
        &mut self,
        originator_id: OriginatorId,
        event: EventName,
        clock: LogicalTime,
    ) -> Result<(), EventLogError> {
        if let Some(previous) = self.branch_log.last() {
            if clock <= previous.clock {
                return Err(EventLogError::ClockRegression {
                    previous: previous.clock,
                    attempted: clock,
                });
            }
        }

        self.branch_log.push(BranchLogEntry {
            originator_id,
            event,
            clock,
        });
        self.by_originator
            .entry(originator_id)
            .or_insert_with(Vec::new)
            .push(OriginatorEvent { clock, event });

        Ok(())
    }

    pub(crate) fn branch_log(&self) -> &[BranchLogEntry] {
        &self.branch_log
    }

    pub(crate) fn by_originator(&self) -> &BTreeMap<OriginatorId, Vec<OriginatorEvent>> {
        &self.by_originator
    }
}
