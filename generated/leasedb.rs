#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPosition {
    #[prost(uint64, tag = "1")]
    pub generation: u64,
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCatalogReq {
    #[prost(string, tag = "1")]
    pub client_hostname: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDatabaseInfo {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub position: ::core::option::Option<ProtoPosition>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCatalog {
    #[prost(message, repeated, tag = "1")]
    pub databases: ::prost::alloc::vec::Vec<ProtoDatabaseInfo>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCatalogMessage {
    #[prost(oneof = "proto_catalog_message::Message", tags = "1, 2")]
    pub message: ::core::option::Option<proto_catalog_message::Message>,
}
/// Nested message and enum types in `ProtoCatalogMessage`.
pub mod proto_catalog_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        Catalog(super::ProtoCatalog),
        #[prost(enumeration = "super::ProtoErrorCode", tag = "2")]
        Error(i32),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStreamReq {
    #[prost(string, tag = "1")]
    pub database: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub resume: ::core::option::Option<ProtoPosition>,
    #[prost(bool, tag = "3")]
    pub resync: bool,
    #[prost(string, tag = "4")]
    pub client_hostname: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFrame {
    #[prost(message, optional, tag = "1")]
    pub position: ::core::option::Option<ProtoPosition>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSnapshot {
    #[prost(message, optional, tag = "1")]
    pub position: ::core::option::Option<ProtoPosition>,
    #[prost(bytes = "vec", tag = "2")]
    pub image: ::prost::alloc::vec::Vec<u8>,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoEnd {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStreamMessage {
    #[prost(oneof = "proto_stream_message::Message", tags = "1, 2, 3, 4")]
    pub message: ::core::option::Option<proto_stream_message::Message>,
}
/// Nested message and enum types in `ProtoStreamMessage`.
pub mod proto_stream_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        Frame(super::ProtoFrame),
        #[prost(message, tag = "2")]
        Snapshot(super::ProtoSnapshot),
        #[prost(message, tag = "3")]
        End(super::ProtoEnd),
        #[prost(enumeration = "super::ProtoErrorCode", tag = "4")]
        Error(i32),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAckReq {
    #[prost(string, tag = "1")]
    pub database: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub client_hostname: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub applied: ::core::option::Option<ProtoPosition>,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAckResult {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNodeInfo {
    #[prost(string, tag = "1")]
    pub hostname: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub advertise_url: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLockReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub holder: ::core::option::Option<ProtoNodeInfo>,
    #[prost(uint64, tag = "3")]
    pub ttl_millis: u64,
    #[prost(uint64, tag = "4")]
    pub lock_delay_millis: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLockGrant {
    #[prost(uint64, tag = "1")]
    pub session: u64,
    #[prost(uint64, tag = "2")]
    pub generation: u64,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSessionInvalid {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCoordinatorError {
    #[prost(oneof = "proto_coordinator_error::Err", tags = "1, 2, 3")]
    pub err: ::core::option::Option<proto_coordinator_error::Err>,
}
/// Nested message and enum types in `ProtoCoordinatorError`.
pub mod proto_coordinator_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        HeldBy(super::ProtoNodeInfo),
        #[prost(uint64, tag = "2")]
        LockDelayRemainingMillis(u64),
        #[prost(message, tag = "3")]
        SessionInvalid(super::ProtoSessionInvalid),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLockResult {
    #[prost(oneof = "proto_lock_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_lock_result::Result>,
}
/// Nested message and enum types in `ProtoLockResult`.
pub mod proto_lock_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoLockGrant),
        #[prost(message, tag = "2")]
        Err(super::ProtoCoordinatorError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRenewReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub session: u64,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRenewSuccess {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRenewResult {
    #[prost(oneof = "proto_renew_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_renew_result::Result>,
}
/// Nested message and enum types in `ProtoRenewResult`.
pub mod proto_renew_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoRenewSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoCoordinatorError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnlockReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub session: u64,
}
/// Unlocking a session that no longer holds the key is not an error.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnlockResult {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHolderReq {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHolderResult {
    #[prost(message, optional, tag = "1")]
    pub holder: ::core::option::Option<ProtoNodeInfo>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoErrorCode {
    Unspecified = 0,
    PositionTooOld = 1,
    UnknownDatabase = 2,
    NotPrimary = 3,
    Desync = 4,
    ResyncUnavailable = 5,
}
#[doc = r" Generated client implementations."]
pub mod grpc_replication_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcReplicationClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcReplicationClient<tonic::transport::Channel> {
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
    impl<T> GrpcReplicationClient<T>
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
        pub async fn watch_catalog(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoCatalogReq>,
        ) -> Result<
            tonic::Response<tonic::codec::Streaming<super::ProtoCatalogMessage>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/leasedb.GrpcReplication/WatchCatalog");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }
        pub async fn stream_frames(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoStreamReq>,
        ) -> Result<
            tonic::Response<tonic::codec::Streaming<super::ProtoStreamMessage>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/leasedb.GrpcReplication/StreamFrames");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }
        pub async fn acknowledge(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoAckReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/leasedb.GrpcReplication/Acknowledge");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcReplicationClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcReplicationClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcReplicationClient {{ ... }}")
        }
    }
}
#[doc = r" Generated client implementations."]
pub mod grpc_lease_coordinator_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcLeaseCoordinatorClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcLeaseCoordinatorClient<tonic::transport::Channel> {
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
    impl<T> GrpcLeaseCoordinatorClient<T>
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
        pub async fn lock(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoLockReq>,
        ) -> Result<tonic::Response<super::ProtoLockResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/leasedb.GrpcLeaseCoordinator/Lock");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn renew(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRenewReq>,
        ) -> Result<tonic::Response<super::ProtoRenewResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/leasedb.GrpcLeaseCoordinator/Renew");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn unlock(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoUnlockReq>,
        ) -> Result<tonic::Response<super::ProtoUnlockResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/leasedb.GrpcLeaseCoordinator/Unlock");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn holder(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoHolderReq>,
        ) -> Result<tonic::Response<super::ProtoHolderResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/leasedb.GrpcLeaseCoordinator/Holder");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcLeaseCoordinatorClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcLeaseCoordinatorClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcLeaseCoordinatorClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_replication_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcReplicationServer."]
    #[async_trait]
    pub trait GrpcReplication: Send + Sync + 'static {
        #[doc = "Server streaming response type for the WatchCatalog method."]
        type WatchCatalogStream: futures_core::Stream<Item = Result<super::ProtoCatalogMessage, tonic::Status>>
            + Send
            + Sync
            + 'static;
        async fn watch_catalog(
            &self,
            request: tonic::Request<super::ProtoCatalogReq>,
        ) -> Result<tonic::Response<Self::WatchCatalogStream>, tonic::Status>;
        #[doc = "Server streaming response type for the StreamFrames method."]
        type StreamFramesStream: futures_core::Stream<Item = Result<super::ProtoStreamMessage, tonic::Status>>
            + Send
            + Sync
            + 'static;
        async fn stream_frames(
            &self,
            request: tonic::Request<super::ProtoStreamReq>,
        ) -> Result<tonic::Response<Self::StreamFramesStream>, tonic::Status>;
        async fn acknowledge(
            &self,
            request: tonic::Request<super::ProtoAckReq>,
        ) -> Result<tonic::Response<super::ProtoAckResult>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcReplicationServer<T: GrpcReplication> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcReplication> GrpcReplicationServer<T> {
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
    impl<T, B> Service<http::Request<B>> for GrpcReplicationServer<T>
    where
        T: GrpcReplication,
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
                "/leasedb.GrpcReplication/WatchCatalog" => {
                    #[allow(non_camel_case_types)]
                    struct WatchCatalogSvc<T: GrpcReplication>(pub Arc<T>);
                    impl<T: GrpcReplication>
                        tonic::server::ServerStreamingService<super::ProtoCatalogReq>
                        for WatchCatalogSvc<T>
                    {
                        type Response = super::ProtoCatalogMessage;
                        type ResponseStream = T::WatchCatalogStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoCatalogReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).watch_catalog(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1;
                        let inner = inner.0;
                        let method = WatchCatalogSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.server_streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/leasedb.GrpcReplication/StreamFrames" => {
                    #[allow(non_camel_case_types)]
                    struct StreamFramesSvc<T: GrpcReplication>(pub Arc<T>);
                    impl<T: GrpcReplication>
                        tonic::server::ServerStreamingService<super::ProtoStreamReq>
                        for StreamFramesSvc<T>
                    {
                        type Response = super::ProtoStreamMessage;
                        type ResponseStream = T::StreamFramesStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoStreamReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).stream_frames(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1;
                        let inner = inner.0;
                        let method = StreamFramesSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.server_streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/leasedb.GrpcReplication/Acknowledge" => {
                    #[allow(non_camel_case_types)]
                    struct AcknowledgeSvc<T: GrpcReplication>(pub Arc<T>);
                    impl<T: GrpcReplication> tonic::server::UnaryService<super::ProtoAckReq> for AcknowledgeSvc<T> {
                        type Response = super::ProtoAckResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoAckReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).acknowledge(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AcknowledgeSvc(inner);
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
    impl<T: GrpcReplication> Clone for GrpcReplicationServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcReplication> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcReplication> tonic::transport::NamedService for GrpcReplicationServer<T> {
        const NAME: &'static str = "leasedb.GrpcReplication";
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_lease_coordinator_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcLeaseCoordinatorServer."]
    #[async_trait]
    pub trait GrpcLeaseCoordinator: Send + Sync + 'static {
        async fn lock(
            &self,
            request: tonic::Request<super::ProtoLockReq>,
        ) -> Result<tonic::Response<super::ProtoLockResult>, tonic::Status>;
        async fn renew(
            &self,
            request: tonic::Request<super::ProtoRenewReq>,
        ) -> Result<tonic::Response<super::ProtoRenewResult>, tonic::Status>;
        async fn unlock(
            &self,
            request: tonic::Request<super::ProtoUnlockReq>,
        ) -> Result<tonic::Response<super::ProtoUnlockResult>, tonic::Status>;
        async fn holder(
            &self,
            request: tonic::Request<super::ProtoHolderReq>,
        ) -> Result<tonic::Response<super::ProtoHolderResult>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcLeaseCoordinatorServer<T: GrpcLeaseCoordinator> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcLeaseCoordinator> GrpcLeaseCoordinatorServer<T> {
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
    impl<T, B> Service<http::Request<B>> for GrpcLeaseCoordinatorServer<T>
    where
        T: GrpcLeaseCoordinator,
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
                "/leasedb.GrpcLeaseCoordinator/Lock" => {
                    #[allow(non_camel_case_types)]
                    struct LockSvc<T: GrpcLeaseCoordinator>(pub Arc<T>);
                    impl<T: GrpcLeaseCoordinator> tonic::server::UnaryService<super::ProtoLockReq> for LockSvc<T> {
                        type Response = super::ProtoLockResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoLockReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).lock(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = LockSvc(inner);
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
                "/leasedb.GrpcLeaseCoordinator/Renew" => {
                    #[allow(non_camel_case_types)]
                    struct RenewSvc<T: GrpcLeaseCoordinator>(pub Arc<T>);
                    impl<T: GrpcLeaseCoordinator> tonic::server::UnaryService<super::ProtoRenewReq> for RenewSvc<T> {
                        type Response = super::ProtoRenewResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRenewReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).renew(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RenewSvc(inner);
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
                "/leasedb.GrpcLeaseCoordinator/Unlock" => {
                    #[allow(non_camel_case_types)]
                    struct UnlockSvc<T: GrpcLeaseCoordinator>(pub Arc<T>);
                    impl<T: GrpcLeaseCoordinator> tonic::server::UnaryService<super::ProtoUnlockReq> for UnlockSvc<T> {
                        type Response = super::ProtoUnlockResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoUnlockReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).unlock(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = UnlockSvc(inner);
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
                "/leasedb.GrpcLeaseCoordinator/Holder" => {
                    #[allow(non_camel_case_types)]
                    struct HolderSvc<T: GrpcLeaseCoordinator>(pub Arc<T>);
                    impl<T: GrpcLeaseCoordinator> tonic::server::UnaryService<super::ProtoHolderReq> for HolderSvc<T> {
                        type Response = super::ProtoHolderResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoHolderReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).holder(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = HolderSvc(inner);
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
    impl<T: GrpcLeaseCoordinator> Clone for GrpcLeaseCoordinatorServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcLeaseCoordinator> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcLeaseCoordinator> tonic::transport::NamedService for GrpcLeaseCoordinatorServer<T> {
        const NAME: &'static str = "leasedb.GrpcLeaseCoordinator";
    }
}
