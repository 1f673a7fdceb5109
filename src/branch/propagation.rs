use crate::actor::ActorClient;
use crate::branch::branch_api::{BranchError, Mutation, PropagationAckInput};
use crate::branch::clock::LogicalTime;
use crate::branch::peer_client::PeerClient;
use crate::branch::peers::{BranchId, OriginatorId, Peer, PeerTable};
use crate::grpc::{ProtoInterface, ProtoMsgDeliveryReply, ProtoMsgDeliveryReq, ProtoResult};
use rand::Rng;
use tokio::time::Duration;

/// RetryPolicy bounds how hard we try to reach a single peer during propagation.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RetryPolicy {
    pub(crate) rpc_timeout: Duration,
    pub(crate) max_attempts: u32,
    pub(crate) initial_backoff: Duration,
}

impl RetryPolicy {
    /// Exponential backoff with up to 50% random jitter added on top, never longer than one
    /// attempt's timeout.
    fn backoff(&self, failed_attempts: u32) -> Duration {
        let exp = 2u32
            .checked_pow(failed_attempts.saturating_sub(1))
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .map_or(self.rpc_timeout, |exp| std::cmp::min(exp, self.rpc_timeout));
        let jitter_ms = rand::thread_rng().gen_range(0..=(exp.as_millis() as u64 / 2));
        std::cmp::min(exp + Duration::from_millis(jitter_ms), self.rpc_timeout)
    }
}

#[derive(Debug)]
pub(crate) struct PropagationOutcome {
    pub(crate) acknowledged: Vec<BranchId>,
    pub(crate) failed: Vec<(BranchId, PropagationError)>,
}

impl PropagationOutcome {
    pub(crate) fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PropagationError {
    #[error("Peer unreachable after {attempts} attempt(s): {last_error}")]
    Unreachable { attempts: u32, last_error: String },
    // Not retried: the peer may have applied the update.
    #[error("Timed out waiting for peer acknowledgement")]
    Timeout,
    #[error("Peer rejected propagation with {0:?}")]
    Rejected(ProtoResult),
    #[error("Malformed reply from peer")]
    MalformedReply,
}

/// Propagator runs the fan-out half of a customer mutation: one peer at a time, waiting for each
/// acknowledgement before contacting the next, and feeding each acknowledgement back into the
/// branch as its own clocked step.
///
/// This runs on the RPC handler's task, never inside the actor, so the branch keeps serving other
/// requests (including propagations from peers) while we wait.
pub(crate) struct Propagator {
    logger: slog::Logger,
    retry_policy: RetryPolicy,
}

impl Propagator {
    pub(crate) fn new(logger: slog::Logger, retry_policy: RetryPolicy) -> Self {
        Propagator { logger, retry_policy }
    }

    pub(crate) async fn broadcast(
        &self,
        branch: &ActorClient,
        peers: PeerTable,
        mutation: Mutation,
        originator_id: OriginatorId,
        amount: i64,
        executed_clock: LogicalTime,
    ) -> Result<PropagationOutcome, BranchError> {
        let mut outcome = PropagationOutcome {
            acknowledged: Vec::with_capacity(peers.len()),
            failed: Vec::new(),
        };

        let mut send_clock = executed_clock;
        for peer in peers {
            let Peer { branch_id, addr, client } = peer;
            let rpc_request = ProtoMsgDeliveryReq {
                id: originator_id.as_u64(),
                interface: ProtoInterface::from(mutation.propagate_interface()) as i32,
                money: amount,
                clock: send_clock.as_u64(),
            };

            let logger = self.logger.new(slog::o!("Peer" => format!("{:?}@{}", branch_id, addr)));
            match self.propagate_to_peer(&logger, client, rpc_request).await {
                Ok(peer_clock) => {
                    send_clock = branch
                        .propagation_ack(PropagationAckInput {
                            mutation,
                            originator_id,
                            peer_clock,
                        })
                        .await?;
                    outcome.acknowledged.push(branch_id);
                }
                Err(e) => {
                    slog::error!(
                        logger,
                        "Propagation of {:?} for originator {:?} failed: {}",
                        mutation,
                        originator_id,
                        e
                    );
                    outcome.failed.push((branch_id, e));
                }
            }
        }

        Ok(outcome)
    }

    async fn propagate_to_peer(
        &self,
        logger: &slog::Logger,
        client: PeerClient,
        rpc_request: ProtoMsgDeliveryReq,
    ) -> Result<LogicalTime, PropagationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            slog::debug!(logger, "ClientWire - {:?}", rpc_request);
            let rpc_reply = client
                .msg_delivery(rpc_request.clone(), self.retry_policy.rpc_timeout)
                .await;
            slog::debug!(logger, "ClientWire - {:?}", rpc_reply);

            let rpc_error = match rpc_reply {
                Ok(Ok(reply)) => return Self::convert_ack(reply),
                Ok(Err(rpc_status)) => format!("{:?}", rpc_status),
                Err(_timeout) => return Err(PropagationError::Timeout),
            };

            if attempt >= self.retry_policy.max_attempts {
                return Err(PropagationError::Unreachable {
                    attempts: attempt,
                    last_error: rpc_error,
                });
            }

            let backoff = self.retry_policy.backoff(attempt);
            slog::warn!(
                logger,
                "Attempt {}/{} failed: {}. Retrying in {}ms.",
                attempt,
                self.retry_policy.max_attempts,
                rpc_error,
                backoff.as_millis()
            );
            tokio::time::sleep(backoff).await;
        }
    }

    fn convert_ack(reply: ProtoMsgDeliveryReply) -> Result<LogicalTime, PropagationError> {
        match ProtoResult::from_i32(reply.result) {
            Some(ProtoResult::Success) => Ok(LogicalTime::new(reply.clock)),
            Some(other) => Err(PropagationError::Rejected(other)),
            None => Err(PropagationError::MalformedReply),
        }
    }
}
