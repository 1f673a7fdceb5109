use crate::actor::ActorClient;
use crate::api::types::{BranchSnapshot, PeerAddress};
use crate::branch::BranchId;
use crate::server::ServerShutdownHandle;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// BranchHandle is the owner's view of one running branch: its address, read-only access to its
/// state, and the means to stop it.
pub struct BranchHandle {
    logger: slog::Logger,
    branch_id: u64,
    addr: SocketAddr,
    actor_client: ActorClient,
    server_shutdown_handle: ServerShutdownHandle,
    server_task: JoinHandle<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum BranchUnavailable {
    #[error("Branch {0} is no longer running")]
    Exited(u64),
}

#[derive(Debug, thiserror::Error)]
#[error("Branch {branch_id} refused its peer table: {reason}")]
pub struct InstallPeersError {
    pub branch_id: u64,
    pub reason: String,
}

impl BranchHandle {
    pub(super) fn new(
        logger: slog::Logger,
        branch_id: u64,
        addr: SocketAddr,
        actor_client: ActorClient,
        server_shutdown_handle: ServerShutdownHandle,
        server_task: JoinHandle<()>,
    ) -> Self {
        BranchHandle {
            logger,
            branch_id,
            addr,
            actor_client,
            server_shutdown_handle,
            server_task,
        }
    }

    pub fn branch_id(&self) -> u64 {
        self.branch_id
    }

    /// The address the branch's gRPC server is actually bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn balance(&self) -> Result<i64, BranchUnavailable> {
        let state = self.actor_client.peek().await.map_err(|_| self.unavailable())?;
        Ok(state.balance)
    }

    pub async fn clock(&self) -> Result<u64, BranchUnavailable> {
        let state = self.actor_client.peek().await.map_err(|_| self.unavailable())?;
        Ok(state.clock.as_u64())
    }

    pub async fn snapshot(&self) -> Result<BranchSnapshot, BranchUnavailable> {
        let snapshot = self.actor_client.snapshot().await.map_err(|_| self.unavailable())?;
        Ok(BranchSnapshot::from(snapshot))
    }

    /// Hands the branch the addresses of every other branch. Accepted exactly once; until then the
    /// branch propagates to nobody.
    pub async fn install_peers(&self, peers: Vec<PeerAddress>) -> Result<(), InstallPeersError> {
        let members = peers
            .into_iter()
            .map(|peer| (BranchId::new(peer.branch_id), peer.addr))
            .collect();

        self.actor_client
            .install_peers(members)
            .await
            .map_err(|e| InstallPeersError {
                branch_id: self.branch_id,
                reason: e.to_string(),
            })
    }

    /// Stops the gRPC server. The actor exits once the server and this handle have let go of it.
    pub async fn shutdown(self) {
        let BranchHandle {
            logger,
            server_shutdown_handle,
            server_task,
            ..
        } = self;

        server_shutdown_handle.shutdown();
        if let Err(e) = server_task.await {
            slog::warn!(logger, "Server task did not exit cleanly: {:?}", e);
        }
    }

    fn unavailable(&self) -> BranchUnavailable {
        BranchUnavailable::Exited(self.branch_id)
    }
}
