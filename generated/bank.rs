#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMsgDeliveryReq {
    /// Customer operation id that started the causal chain. Propagations carry it unchanged.
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(enumeration = "ProtoInterface", tag = "2")]
    pub interface: i32,
    #[prost(int64, tag = "3")]
    pub money: i64,
    #[prost(uint64, tag = "4")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMsgDeliveryReply {
    #[prost(enumeration = "ProtoInterface", tag = "1")]
    pub interface: i32,
    #[prost(enumeration = "ProtoResult", tag = "2")]
    pub result: i32,
    #[prost(int64, tag = "3")]
    pub balance: i64,
    #[prost(uint64, tag = "4")]
    pub clock: u64,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoInterface {
    InterfaceUnspecified = 0,
    Query = 1,
    Deposit = 2,
    Withdraw = 3,
    DepositPropagate = 4,
    WithdrawPropagate = 5,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoResult {
    ResultUnspecified = 0,
    Success = 1,
    PartialPropagation = 2,
    UnknownInterface = 3,
    InvalidAmount = 4,
    ServerFault = 5,
}
#[doc = r" Generated client implementations."]
pub mod grpc_bank_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcBankClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcBankClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcBankClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Single entry point for customer operations and branch-to-branch propagation."]
        pub async fn msg_delivery(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoMsgDeliveryReq>,
        ) -> Result<tonic::Response<super::ProtoMsgDeliveryReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/bank.GrpcBank/MsgDelivery");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcBankClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcBankClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcBankClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_bank_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcBankServer."]
    #[async_trait]
    pub trait GrpcBank: Send + Sync + 'static {
        #[doc = " Single entry point for customer operations and branch-to-branch propagation."]
        async fn msg_delivery(
            &self,
            request: tonic::Request<super::ProtoMsgDeliveryReq>,
        ) -> Result<tonic::Response<super::ProtoMsgDeliveryReply>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcBankServer<T: GrpcBank> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcBank> GrpcBankServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcBankServer<T>
    where
        T: GrpcBank,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/bank.GrpcBank/MsgDelivery" => {
                    #[allow(non_camel_case_types)]
                    struct MsgDeliverySvc<T: GrpcBank>(pub Arc<T>);
                    impl<T: GrpcBank> tonic::server::UnaryService<super::ProtoMsgDeliveryReq> for MsgDeliverySvc<T> {
                        type Response = super::ProtoMsgDeliveryReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoMsgDeliveryReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).msg_delivery(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = MsgDeliverySvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcBank> Clone for GrpcBankServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcBank> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcBank> tonic::transport::NamedService for GrpcBankServer<T> {
        const NAME: &'static str = "bank.GrpcBank";
    }
}
