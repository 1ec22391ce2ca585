use crate::grpc::grpc_lease_coordinator_server::{GrpcLeaseCoordinator, GrpcLeaseCoordinatorServer};
use crate::grpc::{
    proto_coordinator_error, proto_lock_result, proto_renew_result, ProtoCoordinatorError, ProtoHolderReq,
    ProtoHolderResult, ProtoLockGrant, ProtoLockReq, ProtoLockResult, ProtoNodeInfo, ProtoRenewReq, ProtoRenewResult,
    ProtoRenewSuccess, ProtoSessionInvalid, ProtoUnlockReq, ProtoUnlockResult,
};
use crate::lease::{convert_node_info, Coordinator, CoordinatorError, LockRequest, NodeInfo};
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// CoordinatorServer hosts a `Coordinator` behind the `GrpcLeaseCoordinator` service so that
/// nodes in other processes can contend for leases through `GrpcCoordinator`.
pub(crate) struct CoordinatorServer {
    logger: slog::Logger,
    coordinator: Arc<dyn Coordinator>,
}

impl CoordinatorServer {
    pub(crate) fn new(logger: slog::Logger, coordinator: Arc<dyn Coordinator>) -> Self {
        CoordinatorServer { logger, coordinator }
    }

    pub(crate) async fn run(self, listener: TcpListener, mut shutdown_signal: ShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Coordinator listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcLeaseCoordinatorServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown_signal.wait().await
            })
            .await;

        slog::info!(logger, "Coordinator server run() has exited: {:?}", result);
    }

    fn convert_lock_input(rpc_request: ProtoLockReq) -> Result<LockRequest, Status> {
        let holder = rpc_request
            .holder
            .map(convert_node_info)
            .ok_or_else(|| Status::invalid_argument("Missing lock holder"))?;

        Ok(LockRequest {
            key: rpc_request.key,
            holder,
            ttl: Duration::from_millis(rpc_request.ttl_millis),
            lock_delay: Duration::from_millis(rpc_request.lock_delay_millis),
        })
    }

    fn convert_error(error: CoordinatorError) -> Result<ProtoCoordinatorError, Status> {
        let err = match error {
            CoordinatorError::Held { holder } => proto_coordinator_error::Err::HeldBy(node_info_to_proto(holder)),
            CoordinatorError::LockDelay { remaining } => {
                proto_coordinator_error::Err::LockDelayRemainingMillis(remaining.as_millis() as u64)
            }
            CoordinatorError::SessionInvalid => proto_coordinator_error::Err::SessionInvalid(ProtoSessionInvalid {}),
            CoordinatorError::Unavailable(message) => return Err(Status::unavailable(message)),
        };

        Ok(ProtoCoordinatorError { err: Some(err) })
    }
}

fn node_info_to_proto(node: NodeInfo) -> ProtoNodeInfo {
    ProtoNodeInfo {
        hostname: node.hostname,
        advertise_url: node.advertise_url,
    }
}

#[async_trait::async_trait]
impl GrpcLeaseCoordinator for CoordinatorServer {
    async fn lock(&self, rpc_request_wrapped: Request<ProtoLockReq>) -> Result<Response<ProtoLockResult>, Status> {
        let request = Self::convert_lock_input(rpc_request_wrapped.into_inner())?;
        let result = match self.coordinator.lock(request).await {
            Ok(grant) => proto_lock_result::Result::Ok(ProtoLockGrant {
                session: grant.session,
                generation: grant.generation,
            }),
            Err(e) => proto_lock_result::Result::Err(Self::convert_error(e)?),
        };

        Ok(Response::new(ProtoLockResult { result: Some(result) }))
    }

    async fn renew(&self, rpc_request_wrapped: Request<ProtoRenewReq>) -> Result<Response<ProtoRenewResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();
        let result = match self.coordinator.renew(&rpc_request.key, rpc_request.session).await {
            Ok(()) => proto_renew_result::Result::Ok(ProtoRenewSuccess {}),
            Err(e) => proto_renew_result::Result::Err(Self::convert_error(e)?),
        };

        Ok(Response::new(ProtoRenewResult { result: Some(result) }))
    }

    async fn unlock(&self, rpc_request_wrapped: Request<ProtoUnlockReq>) -> Result<Response<ProtoUnlockResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();
        match self.coordinator.unlock(&rpc_request.key, rpc_request.session).await {
            Ok(()) => Ok(Response::new(ProtoUnlockResult {})),
            Err(e) => {
                slog::debug!(self.logger, "Unlock of '{}' failed: {}", rpc_request.key, e);
                Err(Status::unavailable(e.to_string()))
            }
        }
    }

    async fn holder(&self, rpc_request_wrapped: Request<ProtoHolderReq>) -> Result<Response<ProtoHolderResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();
        let holder = self
            .coordinator
            .holder(&rpc_request.key)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(Response::new(ProtoHolderResult {
            holder: holder.map(node_info_to_proto),
        }))
    }
}
