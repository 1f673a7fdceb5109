use crate::api::Interface;
use crate::branch::clock::{ClockError, LogicalTime};
use crate::branch::event_log::{BranchLogEntry, EventLogError, OriginatorEvent};
use crate::branch::ledger::LedgerError;
use crate::branch::peers::{BranchId, InvalidPeerTable, OriginatorId, PeerTable};

/// Mutation is the subset of interfaces that change the balance, independent of whether they came
/// from a customer or were propagated by a peer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Mutation {
    Deposit,
    Withdraw,
}

impl Mutation {
    /// Interface a customer uses for this mutation.
    pub(crate) fn interface(&self) -> Interface {
        match self {
            Mutation::Deposit => Interface::Deposit,
            Mutation::Withdraw => Interface::Withdraw,
        }
    }

    /// Interface a branch uses to forward this mutation to its peers.
    pub(crate) fn propagate_interface(&self) -> Interface {
        match self {
            Mutation::Deposit => Interface::DepositPropagate,
            Mutation::Withdraw => Interface::WithdrawPropagate,
        }
    }
}

/// InboundRequest is a decoded, validated `MsgDelivery` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum InboundRequest {
    Query(InboundMessage),
    FromCustomer(Mutation, InboundMessage),
    FromPeer(Mutation, InboundMessage),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct InboundMessage {
    pub(crate) originator_id: OriginatorId,
    pub(crate) amount: i64,
    pub(crate) clock: LogicalTime,
}

/// BranchState is what every reply reports back: the balance and clock as of the step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct BranchState {
    pub(crate) balance: i64,
    pub(crate) clock: LogicalTime,
}

/// LocallyExecuted is the result of applying a customer mutation on the branch that received it.
/// Propagation to `peers` still has to happen.
#[derive(Clone, Debug)]
pub(crate) struct LocallyExecuted {
    pub(crate) state: BranchState,
    pub(crate) peers: PeerTable,
}

#[derive(Debug)]
pub(crate) struct PropagationAckInput {
    pub(crate) mutation: Mutation,
    pub(crate) originator_id: OriginatorId,
    pub(crate) peer_clock: LogicalTime,
}

#[derive(Clone, Debug)]
pub(crate) struct BranchStateSnapshot {
    pub(crate) branch_id: BranchId,
    pub(crate) balance: i64,
    pub(crate) clock: LogicalTime,
    pub(crate) branch_log: Vec<BranchLogEntry>,
    pub(crate) event_log: Vec<(OriginatorId, Vec<OriginatorEvent>)>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum BranchError {
    #[error("Clock invariant violated: {0}")]
    Clock(#[from] ClockError),
    #[error("Event log invariant violated: {0}")]
    EventLog(#[from] EventLogError),
    #[error("Ledger rejected operation: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Peer table was already installed")]
    PeersAlreadyInstalled,
    #[error("Invalid peer table: {0}")]
    InvalidPeers(#[from] InvalidPeerTable),
    #[error("Branch actor has exited")]
    ActorExited,
}
