use crate::grpc::grpc_bank_client::GrpcBankClient;
use crate::grpc::{ProtoMsgDeliveryReply, ProtoMsgDeliveryReq};
use std::future::Future;
use std::net::SocketAddr;
use tokio::time::error::Elapsed;
use tokio::time::Duration;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// PeerClient is the outbound side of `MsgDelivery` towards one other branch.
#[derive(Clone)]
pub(crate) struct PeerClient {
    inner: GrpcBankClient<Channel>,
}

impl PeerClient {
    /// The connection is established on first use, so a peer that is not (yet) listening only
    /// surfaces as a failed call.
    pub(crate) fn new_lazy(addr: SocketAddr) -> Result<Self, ConnectError> {
        let endpoint = Endpoint::from_shared(format!("http://{}", addr))?;
        let channel = endpoint.connect_lazy()?;

        Ok(PeerClient {
            inner: GrpcBankClient::new(channel),
        })
    }

    /// The returned future owns its own handle on the channel and does not borrow `self`.
    pub(crate) fn msg_delivery(
        &self,
        rpc_request: ProtoMsgDeliveryReq,
        rpc_timeout: Duration,
    ) -> impl Future<Output = Result<Result<ProtoMsgDeliveryReply, Status>, Elapsed>> {
        let mut client = self.inner.clone();
        async move {
            tokio::time::timeout(rpc_timeout, client.msg_delivery(rpc_request))
                .await
                .map(|rpc_result| rpc_result.map(|rpc_reply| rpc_reply.into_inner()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConnectError {
    #[error("Invalid peer uri: {0}")]
    InvalidUri(#[from] uri::InvalidUri),
    #[error("Transport failure: {0}")]
    Transport(#[from] tonic::transport::Error),
}
