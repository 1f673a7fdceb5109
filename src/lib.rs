mod actor;
mod api;
mod branch;
mod customer;
mod server;
mod grpc {
    include!("../generated/bank.rs");
}

pub use api::try_create_branch;
pub use api::try_create_cluster;
pub use api::BranchConfig;
pub use api::BranchCreationError;
pub use api::BranchHandle;
pub use api::BranchLogRecord;
pub use api::BranchOptions;
pub use api::BranchReport;
pub use api::BranchSnapshot;
pub use api::BranchSpec;
pub use api::BranchUnavailable;
pub use api::Cluster;
pub use api::ClusterConfig;
pub use api::ClusterCreationError;
pub use api::CustomerOptions;
pub use api::EventRecord;
pub use api::InstallPeersError;
pub use api::Interface;
pub use api::OperationResult;
pub use api::OriginatorReport;
pub use api::PeerAddress;
pub use api::Report;
pub use customer::CustomerDriver;
pub use customer::CustomerError;
pub use customer::CustomerEvent;
pub use customer::CustomerOutput;
pub use customer::CustomerReply;
pub use customer::NoDelay;
pub use customer::Pacer;
pub use customer::QueryDelayPacer;

// `crate::{root_mod}` should not have any code. Just `mod` and `pub use` statements.
// All `mod` statements, anywhere, should not be `pub`. Only export `pub` via individual use
// statements.
