use crate::actor::{ActorClient, BranchActor};
use crate::api::handle::{BranchHandle, BranchUnavailable, InstallPeersError};
use crate::api::options::BranchOptionsValidated;
use crate::api::types::{BranchSnapshot, PeerAddress};
use crate::api::BranchOptions;
use crate::branch::{Branch, BranchId, Propagator};
use crate::server;
use crate::server::RpcServer;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct BranchConfig {
    pub branch_id: u64,
    pub initial_balance: i64,
    // Port 0 picks a free port; see `BranchHandle::addr()` for the result.
    pub bind_addr: SocketAddr,
    pub info_logger: slog::Logger,
    pub options: BranchOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum BranchCreationError {
    #[error("Illegal options for configuring branch: {0}")]
    IllegalBranchOptions(String),
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, io::Error),
}

/// Starts one branch: its actor and its gRPC server. The branch has no peers until they are
/// installed, so a standalone branch applies mutations locally and propagates to nobody.
pub async fn try_create_branch(config: BranchConfig) -> Result<BranchHandle, BranchCreationError> {
    let BranchConfig {
        branch_id,
        initial_balance,
        bind_addr,
        info_logger,
        options,
    } = config;

    let options = BranchOptionsValidated::try_from(options)
        .map_err(|e| BranchCreationError::IllegalBranchOptions(e.to_string()))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| BranchCreationError::Bind(bind_addr, e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| BranchCreationError::Bind(bind_addr, e))?;

    let logger = info_logger.new(slog::o!("BranchId" => branch_id));

    let (actor_client, actor_queue) = ActorClient::new(options.actor_queue_size);

    let branch = Branch::new(logger.clone(), BranchId::new(branch_id), initial_balance);
    let branch_actor = BranchActor::new(logger.clone(), actor_queue, branch);
    tokio::spawn(branch_actor.run_event_loop());

    let propagator = Propagator::new(logger.clone(), options.retry_policy());
    let rpc_server = RpcServer::new(logger.clone(), actor_client.clone(), propagator);
    let (server_shutdown_handle, server_shutdown_signal) = server::shutdown_signal();
    let server_task = tokio::spawn(rpc_server.run(listener, server_shutdown_signal));

    Ok(BranchHandle::new(
        logger,
        branch_id,
        addr,
        actor_client,
        server_shutdown_handle,
        server_task,
    ))
}

#[derive(Clone, Debug)]
pub struct BranchSpec {
    pub branch_id: u64,
    pub initial_balance: i64,
    pub bind_addr: SocketAddr,
}

pub struct ClusterConfig {
    pub branches: Vec<BranchSpec>,
    pub info_logger: slog::Logger,
    pub options: BranchOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterCreationError {
    #[error("Branch id {0} appears more than once")]
    DuplicateBranchId(u64),
    #[error("Failed to create branch {0}: {1}")]
    Branch(u64, BranchCreationError),
    #[error(transparent)]
    InstallPeers(#[from] InstallPeersError),
}

/// Cluster owns every branch it started. Dropping it stops every server.
pub struct Cluster {
    branches: Vec<BranchHandle>,
}

impl Cluster {
    /// Branches in the order they were configured.
    pub fn branches(&self) -> &[BranchHandle] {
        &self.branches
    }

    pub fn branch(&self, branch_id: u64) -> Option<&BranchHandle> {
        self.branches.iter().find(|branch| branch.branch_id() == branch_id)
    }

    pub async fn snapshots(&self) -> Result<Vec<BranchSnapshot>, BranchUnavailable> {
        let mut snapshots = Vec::with_capacity(self.branches.len());
        for branch in self.branches.iter() {
            snapshots.push(branch.snapshot().await?);
        }

        Ok(snapshots)
    }

    pub async fn shutdown(self) {
        for branch in self.branches.into_iter() {
            branch.shutdown().await;
        }
    }
}

/// Binds every branch first, then gives each one the addresses of all the others. Only after
/// that does the cluster get handed back, so no customer can reach a branch without peers.
pub async fn try_create_cluster(config: ClusterConfig) -> Result<Cluster, ClusterCreationError> {
    let mut seen = HashSet::new();
    for spec in config.branches.iter() {
        if !seen.insert(spec.branch_id) {
            return Err(ClusterCreationError::DuplicateBranchId(spec.branch_id));
        }
    }

    let mut branches = Vec::with_capacity(config.branches.len());
    for spec in config.branches.into_iter() {
        let branch = try_create_branch(BranchConfig {
            branch_id: spec.branch_id,
            initial_balance: spec.initial_balance,
            bind_addr: spec.bind_addr,
            info_logger: config.info_logger.clone(),
            options: config.options.clone(),
        })
        .await
        .map_err(|e| ClusterCreationError::Branch(spec.branch_id, e))?;
        branches.push(branch);
    }

    let addresses: Vec<PeerAddress> = branches
        .iter()
        .map(|branch| PeerAddress {
            branch_id: branch.branch_id(),
            addr: branch.addr(),
        })
        .collect();

    for branch in branches.iter() {
        let peers = addresses
            .iter()
            .filter(|peer| peer.branch_id != branch.branch_id())
            .copied()
            .collect();
        branch.install_peers(peers).await?;
    }

    slog::info!(config.info_logger, "Cluster of {} branch(es) is up", branches.len());
    Ok(Cluster { branches })
}
