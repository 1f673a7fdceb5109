mod branch;
mod branch_api;
mod clock;
mod event_log;
mod ledger;
mod peer_client;
mod peers;
mod propagation;

pub(crate) use branch::Branch;
pub(crate) use branch_api::BranchError;
pub(crate) use branch_api::BranchState;
pub(crate) use branch_api::BranchStateSnapshot;
pub(crate) use branch_api::InboundMessage;
pub(crate) use branch_api::InboundRequest;
pub(crate) use branch_api::LocallyExecuted;
pub(crate) use branch_api::Mutation;
pub(crate) use branch_api::PropagationAckInput;
pub(crate) use clock::LogicalTime;
pub(crate) use event_log::BranchLogEntry;
pub(crate) use event_log::OriginatorEvent;
pub(crate) use ledger::LedgerError;
pub(crate) use peers::BranchId;
pub(crate) use peers::OriginatorId;
pub(crate) use propagation::Propagator;
pub(crate) use propagation::RetryPolicy;
