use crate::actor::ActorClient;
use crate::api::{Interface, OperationResult};
use crate::branch::{
    BranchError, BranchState, InboundMessage, InboundRequest, LedgerError, LogicalTime, Mutation, OriginatorId,
    Propagator,
};
use crate::grpc::grpc_bank_server::{GrpcBank, GrpcBankServer};
use crate::grpc::{ProtoInterface, ProtoMsgDeliveryReply, ProtoMsgDeliveryReq, ProtoResult};
use crate::server::ServerShutdownSignal;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer is the type that implements the bank gRPC interface for one branch.
pub(crate) struct RpcServer {
    logger: slog::Logger,
    local_branch: ActorClient,
    propagator: Propagator,
}

/// Why a request was turned away before reaching the branch.
#[derive(Debug, PartialEq)]
enum Rejection {
    UnknownInterface(i32),
    InvalidAmount(i64),
}

impl RpcServer {
    pub(crate) fn new(logger: slog::Logger, local_branch: ActorClient, propagator: Propagator) -> Self {
        RpcServer {
            logger,
            local_branch,
            propagator,
        }
    }

    pub(crate) async fn run(self, listener: TcpListener, shutdown_signal: ServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcBankServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    async fn handle_msg_delivery(&self, rpc_request: ProtoMsgDeliveryReq) -> ProtoMsgDeliveryReply {
        let interface = rpc_request.interface;

        let app_input = match Self::convert_msg_delivery_input(rpc_request) {
            Ok(input) => input,
            Err(rejection) => {
                slog::warn!(self.logger, "Rejecting request: {:?}", rejection);
                let result = match rejection {
                    Rejection::UnknownInterface(_) => OperationResult::UnknownInterface,
                    Rejection::InvalidAmount(_) => OperationResult::InvalidAmount,
                };
                return self.reply_with_current_state(interface, result).await;
            }
        };

        let app_result = match app_input {
            InboundRequest::Query(input) => self
                .local_branch
                .query(input)
                .await
                .map(|state| (state, OperationResult::Success)),
            InboundRequest::FromPeer(mutation, input) => self
                .local_branch
                .propagation(mutation, input)
                .await
                .map(|state| (state, OperationResult::Success)),
            InboundRequest::FromCustomer(mutation, input) => self.handle_customer_mutation(mutation, input).await,
        };

        match app_result {
            Ok((state, result)) => Self::convert_reply(interface, result, state),
            Err(e) => {
                slog::error!(self.logger, "Request failed: {}", e);
                // An overflowing balance is our fault, not the customer's. The causal chain stops
                // at its request event.
                let result = match e {
                    BranchError::Ledger(LedgerError::NegativeAmount(_)) => OperationResult::InvalidAmount,
                    _ => OperationResult::ServerFault,
                };
                self.reply_with_current_state(interface, result).await
            }
        }
    }

    // request -> execute -> (propagate -> ack)* -> response
    async fn handle_customer_mutation(
        &self,
        mutation: Mutation,
        input: InboundMessage,
    ) -> Result<(BranchState, OperationResult), BranchError> {
        let executed = self.local_branch.customer_request(mutation, input).await?;

        let outcome = self
            .propagator
            .broadcast(
                &self.local_branch,
                executed.peers,
                mutation,
                input.originator_id,
                input.amount,
                executed.state.clock,
            )
            .await?;

        let state = self
            .local_branch
            .customer_response(mutation, input.originator_id)
            .await?;

        if outcome.is_complete() {
            Ok((state, OperationResult::Success))
        } else {
            slog::warn!(
                self.logger,
                "Partial propagation for originator {:?}: acknowledged by {:?}, failed: {:?}",
                input.originator_id,
                outcome.acknowledged,
                outcome.failed
            );
            Ok((state, OperationResult::PartialPropagation))
        }
    }

    async fn reply_with_current_state(&self, interface: i32, result: OperationResult) -> ProtoMsgDeliveryReply {
        let state = match self.local_branch.peek().await {
            Ok(state) => state,
            Err(_) => BranchState {
                balance: 0,
                clock: LogicalTime::default(),
            },
        };

        Self::convert_reply(interface, result, state)
    }

    fn convert_msg_delivery_input(rpc_request: ProtoMsgDeliveryReq) -> Result<InboundRequest, Rejection> {
        let interface = ProtoInterface::from_i32(rpc_request.interface)
            .and_then(Self::convert_interface)
            .ok_or(Rejection::UnknownInterface(rpc_request.interface))?;

        let message = InboundMessage {
            originator_id: OriginatorId::new(rpc_request.id),
            amount: rpc_request.money,
            clock: LogicalTime::new(rpc_request.clock),
        };

        if interface.is_mutation() && rpc_request.money < 0 {
            return Err(Rejection::InvalidAmount(rpc_request.money));
        }

        Ok(match interface {
            Interface::Query => InboundRequest::Query(message),
            Interface::Deposit => InboundRequest::FromCustomer(Mutation::Deposit, message),
            Interface::Withdraw => InboundRequest::FromCustomer(Mutation::Withdraw, message),
            Interface::DepositPropagate => InboundRequest::FromPeer(Mutation::Deposit, message),
            Interface::WithdrawPropagate => InboundRequest::FromPeer(Mutation::Withdraw, message),
        })
    }

    fn convert_interface(proto_interface: ProtoInterface) -> Option<Interface> {
        match proto_interface {
            ProtoInterface::InterfaceUnspecified => None,
            ProtoInterface::Query => Some(Interface::Query),
            ProtoInterface::Deposit => Some(Interface::Deposit),
            ProtoInterface::Withdraw => Some(Interface::Withdraw),
            ProtoInterface::DepositPropagate => Some(Interface::DepositPropagate),
            ProtoInterface::WithdrawPropagate => Some(Interface::WithdrawPropagate),
        }
    }

    fn convert_reply(interface: i32, result: OperationResult, state: BranchState) -> ProtoMsgDeliveryReply {
        ProtoMsgDeliveryReply {
            interface,
            result: ProtoResult::from(result) as i32,
            balance: state.balance,
            clock: state.clock.as_u64(),
        }
    }
}

#[async_trait::async_trait]
impl GrpcBank for RpcServer {
    async fn msg_delivery(
        &self,
        rpc_request_wrapped: Request<ProtoMsgDeliveryReq>,
    ) -> Result<Response<ProtoMsgDeliveryReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_msg_delivery(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }
}

// ------- Conversions --------

impl From<Interface> for ProtoInterface {
    fn from(interface: Interface) -> Self {
        match interface {
            Interface::Query => ProtoInterface::Query,
            Interface::Deposit => ProtoInterface::Deposit,
            Interface::Withdraw => ProtoInterface::Withdraw,
            Interface::DepositPropagate => ProtoInterface::DepositPropagate,
            Interface::WithdrawPropagate => ProtoInterface::WithdrawPropagate,
        }
    }
}

impl From<OperationResult> for ProtoResult {
    fn from(result: OperationResult) -> Self {
        match result {
            OperationResult::Success => ProtoResult::Success,
            OperationResult::PartialPropagation => ProtoResult::PartialPropagation,
            OperationResult::UnknownInterface => ProtoResult::UnknownInterface,
            OperationResult::InvalidAmount => ProtoResult::InvalidAmount,
            OperationResult::ServerFault => ProtoResult::ServerFault,
        }
    }
}

impl ProtoResult {
    /// `None` for values this build doesn't know about, including `RESULT_UNSPECIFIED`.
    pub(crate) fn into_operation_result(self) -> Option<OperationResult> {
        match self {
            ProtoResult::ResultUnspecified => None,
            ProtoResult::Success => Some(OperationResult::Success),
            ProtoResult::PartialPropagation => Some(OperationResult::PartialPropagation),
            ProtoResult::UnknownInterface => Some(OperationResult::UnknownInterface),
            ProtoResult::InvalidAmount => Some(OperationResult::InvalidAmount),
            ProtoResult::ServerFault => Some(OperationResult::ServerFault),
        }
    }
}

impl ProtoInterface {
    pub(crate) fn into_interface(self) -> Option<Interface> {
        RpcServer::convert_interface(self)
    }
}
