use crate::branch::{
    Branch, BranchError, BranchId, BranchState, BranchStateSnapshot, InboundMessage, LocallyExecuted, LogicalTime,
    Mutation, OriginatorId, PropagationAckInput,
};
use std::fmt::Debug;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};

// Each event is one atomic step against the branch. Propagation to peers is deliberately NOT an
// event: it is driven by the RPC handler between `CustomerRequest` and `CustomerResponse`, so
// other requests can interleave while we wait on the network.
#[derive(Debug)]
enum Event {
    // Tick on receipt, log, reply with balance.
    Query(InboundMessage, Callback<BranchState, BranchError>),

    // Tick+log receipt, tick+log execute with ledger update. Reply includes who to propagate to.
    CustomerRequest(Mutation, InboundMessage, Callback<LocallyExecuted, BranchError>),

    // Tick+log receipt, tick+log execute with ledger update. Never re-propagated.
    Propagation(Mutation, InboundMessage, Callback<BranchState, BranchError>),

    // Tick with peer's clock, log.
    PropagationAck(PropagationAckInput, Callback<LogicalTime, BranchError>),

    // Tick, log, reply with balance.
    CustomerResponse(Mutation, OriginatorId, Callback<BranchState, BranchError>),

    // Once, after every branch in the cluster has bound its server.
    InstallPeers(Vec<(BranchId, SocketAddr)>, Callback<(), BranchError>),

    // Read-only.
    Peek(oneshot::Sender<BranchState>),
    Snapshot(oneshot::Sender<BranchStateSnapshot>),
}

#[derive(Debug)]
struct Callback<O: Debug, E: Debug>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Debug> Callback<O, E> {
    pub fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

/// ActorClient is the handle through which every caller (RPC handlers, the propagator, the branch
/// handle) reaches the branch. The actor stops once every client is dropped.
#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn new(buffer_size: usize) -> (Self, ActorQueue) {
        let (tx, rx) = mpsc::channel(buffer_size);

        (ActorClient { sender: tx }, ActorQueue { receiver: rx })
    }

    pub(crate) async fn query(&self, input: InboundMessage) -> Result<BranchState, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Query(input, Callback(tx))).await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn customer_request(
        &self,
        mutation: Mutation,
        input: InboundMessage,
    ) -> Result<LocallyExecuted, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::CustomerRequest(mutation, input, Callback(tx))).await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn propagation(&self, mutation: Mutation, input: InboundMessage) -> Result<BranchState, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Propagation(mutation, input, Callback(tx))).await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn propagation_ack(&self, input: PropagationAckInput) -> Result<LogicalTime, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::PropagationAck(input, Callback(tx))).await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn customer_response(
        &self,
        mutation: Mutation,
        originator_id: OriginatorId,
    ) -> Result<BranchState, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::CustomerResponse(mutation, originator_id, Callback(tx)))
            .await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn install_peers(&self, members: Vec<(BranchId, SocketAddr)>) -> Result<(), BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::InstallPeers(members, Callback(tx))).await?;
        Self::await_callback(rx).await
    }

    pub(crate) async fn peek(&self) -> Result<BranchState, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Peek(tx)).await?;
        rx.await.map_err(|_| BranchError::ActorExited)
    }

    pub(crate) async fn snapshot(&self) -> Result<BranchStateSnapshot, BranchError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Snapshot(tx)).await?;
        rx.await.map_err(|_| BranchError::ActorExited)
    }

    async fn send(&self, event: Event) -> Result<(), BranchError> {
        self.sender.send(event).await.map_err(|_| BranchError::ActorExited)
    }

    async fn await_callback<O>(rx: oneshot::Receiver<Result<O, BranchError>>) -> Result<O, BranchError> {
        rx.await.map_err(|_| BranchError::ActorExited)?
    }
}

pub(crate) struct ActorQueue {
    receiver: mpsc::Receiver<Event>,
}

/// BranchActor owns the Branch and applies events to it one at a time.
pub(crate) struct BranchActor {
    logger: slog::Logger,
    queue: ActorQueue,
    branch: Branch,
}

impl BranchActor {
    pub(crate) fn new(logger: slog::Logger, queue: ActorQueue, branch: Branch) -> Self {
        BranchActor { logger, queue, branch }
    }

    pub(crate) async fn run_event_loop(mut self) {
        slog::info!(self.logger, "Branch actor started");
        while let Some(event) = self.queue.receiver.recv().await {
            self.handle_event(event);
        }
        slog::info!(self.logger, "Branch actor exiting: all clients dropped");
    }

    // This must NOT be async. Anything that waits on the network happens outside the actor.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Query(input, callback) => {
                callback.send(self.branch.handle_query(input));
            }
            Event::CustomerRequest(mutation, input, callback) => {
                callback.send(self.branch.handle_customer_request(mutation, input));
            }
            Event::Propagation(mutation, input, callback) => {
                callback.send(self.branch.handle_propagation(mutation, input));
            }
            Event::PropagationAck(input, callback) => {
                callback.send(self.branch.handle_propagation_ack(input));
            }
            Event::CustomerResponse(mutation, originator_id, callback) => {
                callback.send(self.branch.handle_customer_response(mutation, originator_id));
            }
            Event::InstallPeers(members, callback) => {
                callback.send(self.branch.install_peers(members));
            }
            Event::Peek(tx) => {
                let _ = tx.send(self.branch.state());
            }
            Event::Snapshot(tx) => {
                let _ = tx.send(self.branch.snapshot());
            }
        }
    }
}
