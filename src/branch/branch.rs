use crate::branch::branch_api::{
    BranchError, BranchState, BranchStateSnapshot, InboundMessage, LocallyExecuted, Mutation, PropagationAckInput,
};
use crate::branch::clock::{LamportClock, LogicalTime};
use crate::branch::event_log::{EventLog, EventName, Phase};
use crate::branch::ledger::Ledger;
use crate::branch::peers::{BranchId, OriginatorId, PeerTable};
use crate::api::Interface;
use std::net::SocketAddr;

/// Branch is one replica of the account. All methods are synchronous and each one is a single
/// atomic step with respect to every other call; the actor guarantees that by owning the Branch
/// and running one call at a time.
///
/// Every logged event costs exactly one clock tick, and that tick is only kept if the event was
/// appended to the log.
pub(crate) struct Branch {
    logger: slog::Logger,
    my_branch_id: BranchId,
    ledger: Ledger,
    clock: LamportClock,
    event_log: EventLog,
    peers: Option<PeerTable>,
}

impl Branch {
    pub(crate) fn new(logger: slog::Logger, my_branch_id: BranchId, initial_balance: i64) -> Self {
        Branch {
            logger,
            my_branch_id,
            ledger: Ledger::new(initial_balance),
            clock: LamportClock::new(),
            event_log: EventLog::new(),
            peers: None,
        }
    }

    pub(crate) fn install_peers(&mut self, members: Vec<(BranchId, SocketAddr)>) -> Result<(), BranchError> {
        if self.peers.is_some() {
            return Err(BranchError::PeersAlreadyInstalled);
        }

        let peers = PeerTable::create_valid(self.my_branch_id, members)?;
        slog::info!(self.logger, "Installed peer table: {:?}", peers);
        self.peers = Some(peers);

        Ok(())
    }

    /// Query: tick on receipt, log it, report the balance. Nothing else changes.
    pub(crate) fn handle_query(&mut self, input: InboundMessage) -> Result<BranchState, BranchError> {
        self.record(
            input.originator_id,
            EventName::new(Interface::Query, Phase::Request),
            input.clock,
        )?;

        Ok(self.state())
    }

    /// Customer deposit/withdraw: request event, then execute event with the ledger update. The
    /// returned peer table is who the caller must now propagate to.
    pub(crate) fn handle_customer_request(
        &mut self,
        mutation: Mutation,
        input: InboundMessage,
    ) -> Result<LocallyExecuted, BranchError> {
        let interface = mutation.interface();
        self.record(
            input.originator_id,
            EventName::new(interface, Phase::Request),
            input.clock,
        )?;
        self.execute(input.originator_id, interface, mutation, input.amount)?;

        let peers = match &self.peers {
            Some(peers) => peers.clone(),
            None => {
                slog::warn!(
                    self.logger,
                    "Customer request from {:?} before peer table was installed. Not propagating.",
                    input.originator_id
                );
                PeerTable::empty()
            }
        };

        Ok(LocallyExecuted {
            state: self.state(),
            peers,
        })
    }

    /// Propagated deposit/withdraw from a peer: request event, then execute event with the ledger
    /// update. Never propagated any further.
    pub(crate) fn handle_propagation(
        &mut self,
        mutation: Mutation,
        input: InboundMessage,
    ) -> Result<BranchState, BranchError> {
        let interface = mutation.propagate_interface();
        self.record(
            input.originator_id,
            EventName::new(interface, Phase::Request),
            input.clock,
        )?;
        self.execute(input.originator_id, interface, mutation, input.amount)?;

        Ok(self.state())
    }

    /// A peer acknowledged a propagation. Returns our clock after merging the peer's.
    pub(crate) fn handle_propagation_ack(&mut self, input: PropagationAckInput) -> Result<LogicalTime, BranchError> {
        self.record(
            input.originator_id,
            EventName::new(input.mutation.propagate_interface(), Phase::Response),
            input.peer_clock,
        )
    }

    /// Final step of a customer mutation, right before replying to the customer.
    pub(crate) fn handle_customer_response(
        &mut self,
        mutation: Mutation,
        originator_id: OriginatorId,
    ) -> Result<BranchState, BranchError> {
        self.record_local(originator_id, EventName::new(mutation.interface(), Phase::Response))?;

        Ok(self.state())
    }

    pub(crate) fn state(&self) -> BranchState {
        BranchState {
            balance: self.ledger.balance(),
            clock: self.clock.now(),
        }
    }

    pub(crate) fn snapshot(&self) -> BranchStateSnapshot {
        BranchStateSnapshot {
            branch_id: self.my_branch_id,
            balance: self.ledger.balance(),
            clock: self.clock.now(),
            branch_log: self.event_log.branch_log().to_vec(),
            event_log: self
                .event_log
                .by_originator()
                .iter()
                .map(|(id, events)| (*id, events.clone()))
                .collect(),
        }
    }

    fn execute(
        &mut self,
        originator_id: OriginatorId,
        interface: Interface,
        mutation: Mutation,
        amount: i64,
    ) -> Result<LogicalTime, BranchError> {
        let Branch {
            clock,
            ledger,
            event_log,
            ..
        } = self;

        let received = clock.now();
        let result = clock.tick(received, |stamp| {
            // Validate, then log, then apply. The apply cannot fail once validated, so either
            // both the balance and the log move or neither does.
            match mutation {
                Mutation::Deposit => ledger.balance_after_deposit(amount)?,
                Mutation::Withdraw => ledger.balance_after_withdraw(amount)?,
            };
            event_log.append(originator_id, EventName::new(interface, Phase::Execute), stamp)?;
            match mutation {
                Mutation::Deposit => ledger.deposit(amount)?,
                Mutation::Withdraw => ledger.withdraw(amount)?,
            };
            Ok::<(), BranchError>(())
        });

        self.log_step_result(originator_id, interface, Phase::Execute, &result);
        result
    }

    fn record_local(&mut self, originator_id: OriginatorId, event: EventName) -> Result<LogicalTime, BranchError> {
        let received = self.clock.now();
        self.record(originator_id, event, received)
    }

    fn record(
        &mut self,
        originator_id: OriginatorId,
        event: EventName,
        received: LogicalTime,
    ) -> Result<LogicalTime, BranchError> {
        let Branch { clock, event_log, .. } = self;

        let result = clock.tick(received, |stamp| {
            event_log.append(originator_id, event, stamp)?;
            Ok::<(), BranchError>(())
        });

        self.log_step_result(originator_id, event.interface, event.phase, &result);
        result
    }

    fn log_step_result(
        &self,
        originator_id: OriginatorId,
        interface: Interface,
        phase: Phase,
        result: &Result<LogicalTime, BranchError>,
    ) {
        match result {
            Ok(clock) => slog::debug!(
                self.logger,
                "{} @ {:?} (originator: {:?}, balance: {})",
                EventName::new(interface, phase),
                clock,
                originator_id,
                self.ledger.balance()
            ),
            Err(BranchError::Ledger(e)) => slog::warn!(
                self.logger,
                "{} rejected for originator {:?}: {}",
                EventName::new(interface, phase),
                originator_id,
                e
            ),
            Err(e) => slog::error!(
                self.logger,
                "Refusing {} for originator {:?}: {}",
                EventName::new(interface, phase),
                originator_id,
                e
            ),
        }
    }
}
