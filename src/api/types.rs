use crate::branch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Interface is the kind of operation carried by a `MsgDelivery` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    Query,
    Deposit,
    Withdraw,
    DepositPropagate,
    WithdrawPropagate,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::Query => "query",
            Interface::Deposit => "deposit",
            Interface::Withdraw => "withdraw",
            Interface::DepositPropagate => "deposit_propagate",
            Interface::WithdrawPropagate => "withdraw_propagate",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Interface::Query)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OperationResult is the outcome a branch reports for a single `MsgDelivery` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Success,
    /// Applied locally, but at least one peer never acknowledged the propagation.
    PartialPropagation,
    UnknownInterface,
    InvalidAmount,
    ServerFault,
}

/// PeerAddress is one entry of a branch's peer address table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeerAddress {
    pub branch_id: u64,
    pub addr: SocketAddr,
}

/// One `branchLog` record: an event this branch stepped through, stamped with its clock.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BranchLogRecord {
    pub id: u64,
    pub name: String,
    pub clock: u64,
}

/// One `eventLog` record for some originator id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EventRecord {
    pub clock: u64,
    pub name: String,
}

/// BranchSnapshot is a point-in-time copy of a branch's state and logs.
#[derive(Clone, Debug)]
pub struct BranchSnapshot {
    pub branch_id: u64,
    pub balance: i64,
    pub clock: u64,
    pub branch_log: Vec<BranchLogRecord>,
    /// Keyed by originator id, in ascending id order.
    pub event_log: Vec<(u64, Vec<EventRecord>)>,
}

// ------- Conversions --------

impl From<&branch::BranchLogEntry> for BranchLogRecord {
    fn from(entry: &branch::BranchLogEntry) -> Self {
        BranchLogRecord {
            id: entry.originator_id.as_u64(),
            name: entry.event.to_string(),
            clock: entry.clock.as_u64(),
        }
    }
}

impl From<&branch::OriginatorEvent> for EventRecord {
    fn from(event: &branch::OriginatorEvent) -> Self {
        EventRecord {
            clock: event.clock.as_u64(),
            name: event.event.to_string(),
        }
    }
}

impl From<branch::BranchStateSnapshot> for BranchSnapshot {
    fn from(internal: branch::BranchStateSnapshot) -> Self {
        BranchSnapshot {
            branch_id: internal.branch_id.as_u64(),
            balance: internal.balance,
            clock: internal.clock.as_u64(),
            branch_log: internal.branch_log.iter().map(BranchLogRecord::from).collect(),
            event_log: internal
                .event_log
                .iter()
                .map(|(originator_id, events)| {
                    (
                        originator_id.as_u64(),
                        events.iter().map(EventRecord::from).collect(),
                    )
                })
                .collect(),
        }
    }
}
