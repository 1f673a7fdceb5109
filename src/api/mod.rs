//! This mod is meant to hold most of the code for the library's client-facing API.
mod handle;
mod options;
mod report;
mod types;
mod wiring;

pub use handle::BranchHandle;
pub use handle::BranchUnavailable;
pub use handle::InstallPeersError;
pub use options::BranchOptions;
pub use options::CustomerOptions;
pub use report::BranchReport;
pub use report::OriginatorReport;
pub use report::Report;
pub use types::BranchLogRecord;
pub use types::BranchSnapshot;
pub use types::EventRecord;
pub use types::Interface;
pub use types::OperationResult;
pub use types::PeerAddress;
pub use wiring::try_create_branch;
pub use wiring::try_create_cluster;
pub use wiring::BranchConfig;
pub use wiring::BranchCreationError;
pub use wiring::BranchSpec;
pub use wiring::Cluster;
pub use wiring::ClusterConfig;
pub use wiring::ClusterCreationError;
