use crate::api::{Interface, OperationResult};
use crate::branch::LogicalTime;
use crate::customer::pacer::{NoDelay, Pacer};
use crate::grpc::grpc_bank_client::GrpcBankClient;
use crate::grpc::{ProtoInterface, ProtoMsgDeliveryReply, ProtoMsgDeliveryReq, ProtoResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};

/// CustomerEvent is one operation from a customer's script. `id` is the operation id; it is sent
/// as the originator id, so every branch's event log groups this operation's steps under it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CustomerEvent {
    pub id: u64,
    pub interface: Interface,
    #[serde(default)]
    pub money: i64,
}

/// CustomerReply is a branch reply as the customer records it. Replies to mutations drop the
/// balance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CustomerReply {
    pub interface: Interface,
    pub result: OperationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    pub clock: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CustomerOutput {
    pub id: u64,
    pub recv: Vec<CustomerReply>,
}

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Invalid branch uri: {0}")]
    InvalidUri(#[from] uri::InvalidUri),
    #[error("Failed to connect to branch: {0}")]
    Connect(#[from] tonic::transport::Error),
    // Not retried: a mutation may or may not have been applied.
    #[error("MsgDelivery call for event {event_id} failed: {status}")]
    Rpc { event_id: u64, status: tonic::Status },
    #[error("Malformed reply for event {event_id}: {reason}")]
    MalformedReply { event_id: u64, reason: String },
}

/// CustomerDriver replays a fixed list of operations against its branch, one at a time, waiting
/// for each reply before sending the next.
pub struct CustomerDriver<P: Pacer = NoDelay> {
    logger: slog::Logger,
    customer_id: u64,
    events: Vec<CustomerEvent>,
    client: GrpcBankClient<Channel>,
    clock: LogicalTime,
    pacer: P,
}

impl<P: Pacer> CustomerDriver<P> {
    pub async fn connect(
        logger: slog::Logger,
        customer_id: u64,
        events: Vec<CustomerEvent>,
        branch_addr: SocketAddr,
        pacer: P,
    ) -> Result<Self, CustomerError> {
        let logger = logger.new(slog::o!("CustomerId" => customer_id));
        let url = format!("http://{}", branch_addr);
        slog::info!(logger, "Connecting to {} ...", url);
        let connection = Endpoint::from_shared(url)?.connect().await?;

        Ok(CustomerDriver {
            logger,
            customer_id,
            events,
            client: GrpcBankClient::new(connection),
            clock: LogicalTime::default(),
            pacer,
        })
    }

    pub fn customer_id(&self) -> u64 {
        self.customer_id
    }

    pub async fn execute_events(mut self) -> Result<CustomerOutput, CustomerError> {
        let events = std::mem::take(&mut self.events);
        let mut recv = Vec::with_capacity(events.len());

        for event in events.into_iter() {
            let reply = self.execute_event(&event).await?;
            recv.push(reply);
        }

        slog::info!(self.logger, "Finished {} event(s)", recv.len());
        Ok(CustomerOutput {
            id: self.customer_id,
            recv,
        })
    }

    async fn execute_event(&mut self, event: &CustomerEvent) -> Result<CustomerReply, CustomerError> {
        // Only mutations advance the customer's clock, and they do so before sending.
        if event.interface.is_mutation() {
            self.clock = LogicalTime::new(self.clock.as_u64() + 1);
        }
        self.pacer.pause(event.interface).await;

        let rpc_request = ProtoMsgDeliveryReq {
            id: event.id,
            interface: ProtoInterface::from(event.interface) as i32,
            money: event.money,
            clock: self.clock.as_u64(),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_result = self.client.msg_delivery(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_result);

        let rpc_reply = rpc_result
            .map_err(|status| CustomerError::Rpc {
                event_id: event.id,
                status,
            })?
            .into_inner();

        Self::convert_reply(event.id, rpc_reply)
    }

    fn convert_reply(event_id: u64, rpc_reply: ProtoMsgDeliveryReply) -> Result<CustomerReply, CustomerError> {
        let malformed = |reason: String| CustomerError::MalformedReply { event_id, reason };

        let interface = ProtoInterface::from_i32(rpc_reply.interface)
            .and_then(ProtoInterface::into_interface)
            .ok_or_else(|| malformed(format!("unknown interface {}", rpc_reply.interface)))?;
        let result = ProtoResult::from_i32(rpc_reply.result)
            .and_then(ProtoResult::into_operation_result)
            .ok_or_else(|| malformed(format!("unknown result {}", rpc_reply.result)))?;

        let balance = if interface.is_mutation() {
            None
        } else {
            Some(rpc_reply.balance)
        };

        Ok(CustomerReply {
            interface,
            result,
            balance,
            clock: rpc_reply.clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Driver = CustomerDriver<NoDelay>;

    fn reply(interface: ProtoInterface, result: ProtoResult) -> ProtoMsgDeliveryReply {
        ProtoMsgDeliveryReply {
            interface: interface as i32,
            result: result as i32,
            balance: 150,
            clock: 7,
        }
    }

    #[test]
    fn mutation_replies_drop_balance() {
        let converted = Driver::convert_reply(1, reply(ProtoInterface::Deposit, ProtoResult::Success)).unwrap();
        assert_eq!(
            converted,
            CustomerReply {
                interface: Interface::Deposit,
                result: OperationResult::Success,
                balance: None,
                clock: 7,
            }
        );
    }

    #[test]
    fn query_replies_keep_balance() {
        let converted = Driver::convert_reply(1, reply(ProtoInterface::Query, ProtoResult::Success)).unwrap();
        assert_eq!(converted.balance, Some(150));
    }

    #[test]
    fn partial_propagation_is_surfaced() {
        let converted =
            Driver::convert_reply(1, reply(ProtoInterface::Withdraw, ProtoResult::PartialPropagation)).unwrap();
        assert_eq!(converted.result, OperationResult::PartialPropagation);
    }

    #[test]
    fn malformed_replies_are_errors() {
        let result = Driver::convert_reply(3, reply(ProtoInterface::InterfaceUnspecified, ProtoResult::Success));
        assert!(matches!(result, Err(CustomerError::MalformedReply { event_id: 3, .. })));

        let result = Driver::convert_reply(4, reply(ProtoInterface::Deposit, ProtoResult::ResultUnspecified));
        assert!(matches!(result, Err(CustomerError::MalformedReply { event_id: 4, .. })));
    }

    #[test]
    fn events_parse_from_input_format() {
        let events: Vec<CustomerEvent> = serde_json::from_str(
            r#"[
                {"id": 1, "interface": "deposit", "money": 50},
                {"id": 2, "interface": "query"},
                {"id": 3, "interface": "withdraw", "money": 30}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            events,
            vec![
                CustomerEvent {
                    id: 1,
                    interface: Interface::Deposit,
                    money: 50,
                },
                CustomerEvent {
                    id: 2,
                    interface: Interface::Query,
                    money: 0,
                },
                CustomerEvent {
                    id: 3,
                    interface: Interface::Withdraw,
                    money: 30,
                },
            ]
        );
    }
}
