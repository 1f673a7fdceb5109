use crate::branch::peer_client::{ConnectError, PeerClient};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct BranchId(u64);

impl BranchId {
    pub(crate) fn new(id: u64) -> Self {
        BranchId(id)
    }

    pub(crate) fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch-{}", self.0)
    }
}

/// OriginatorId identifies whoever started a causal chain: the id a customer stamps on its
/// request, which every propagation of that request carries unchanged.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct OriginatorId(u64);

impl OriginatorId {
    pub(crate) fn new(id: u64) -> Self {
        OriginatorId(id)
    }

    pub(crate) fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for OriginatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub(crate) struct Peer {
    pub(crate) branch_id: BranchId,
    pub(crate) addr: SocketAddr,
    pub(crate) client: PeerClient,
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.branch_id, self.addr)
    }
}

/// PeerTable holds a handle to every other branch. It is filled in once, after every branch of
/// the cluster has bound its server, and never changes afterwards.
#[derive(Clone, Debug, Default)]
pub(crate) struct PeerTable {
    peers: Vec<Peer>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum InvalidPeerTable {
    #[error("Peer table lists this branch ({0:?}) as its own peer")]
    ContainsSelf(BranchId),
    #[error("Peer table lists {0:?} more than once")]
    DuplicatePeer(BranchId),
    #[error("Failed to create client for peer {0:?}: {1}")]
    Connect(BranchId, ConnectError),
}

impl PeerTable {
    pub(crate) fn empty() -> Self {
        PeerTable::default()
    }

    pub(crate) fn create_valid(
        my_branch_id: BranchId,
        members: Vec<(BranchId, SocketAddr)>,
    ) -> Result<Self, InvalidPeerTable> {
        let mut seen = HashSet::with_capacity(members.len());
        let mut peers = Vec::with_capacity(members.len());
        for (branch_id, addr) in members.into_iter() {
            if branch_id == my_branch_id {
                return Err(InvalidPeerTable::ContainsSelf(branch_id));
            }
            if !seen.insert(branch_id) {
                return Err(InvalidPeerTable::DuplicatePeer(branch_id));
            }

            let client = PeerClient::new_lazy(addr).map_err(|e| InvalidPeerTable::Connect(branch_id, e))?;
            peers.push(Peer {
                branch_id,
                addr,
                client,
            });
        }

        Ok(PeerTable { peers })
    }

    pub(crate) fn len(&self) -> usize {
        self.peers.len()
    }
}

impl IntoIterator for PeerTable {
    type Item = Peer;
    type IntoIter = std::vec::IntoIter<Peer>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.into_iter()
    }
}
