use crate::grpc::grpc_lease_coordinator_client::GrpcLeaseCoordinatorClient;
use crate::grpc::{
    proto_coordinator_error, proto_lock_result, proto_renew_result, ProtoCoordinatorError, ProtoHolderReq,
    ProtoLockReq, ProtoNodeInfo, ProtoRenewReq, ProtoUnlockReq,
};
use crate::lease::{Coordinator, CoordinatorError, LockGrant, LockRequest, NodeInfo};
use tokio::sync::Mutex;
use tokio::time::Duration;
use tonic::transport::Channel;
use tonic::Status;

/// GrpcCoordinator talks to a coordinator hosted by `run_coordinator_server()` in another
/// process. The channel is created lazily and dropped after any transport failure, so a
/// restarted coordinator is picked up on the next call.
pub struct GrpcCoordinator {
    logger: slog::Logger,
    url: String,
    client: Mutex<Option<GrpcLeaseCoordinatorClient<Channel>>>,
}

impl GrpcCoordinator {
    pub fn new(logger: slog::Logger, url: impl Into<String>) -> Self {
        let url = url.into();
        GrpcCoordinator {
            logger: logger.new(slog::o!("Coordinator" => url.clone())),
            url,
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<GrpcLeaseCoordinatorClient<Channel>, CoordinatorError> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        slog::debug!(self.logger, "Connecting to coordinator");
        let client = GrpcLeaseCoordinatorClient::connect(self.url.clone())
            .await
            .map_err(|e| CoordinatorError::Unavailable(e.to_string()))?;
        guard.replace(client.clone());

        Ok(client)
    }

    async fn on_status(&self, status: Status) -> CoordinatorError {
        slog::debug!(self.logger, "Coordinator call failed: {:?}", status);
        self.client.lock().await.take();
        CoordinatorError::Unavailable(status.message().to_string())
    }

    fn convert_error(err: Option<ProtoCoordinatorError>) -> CoordinatorError {
        match err.and_then(|e| e.err) {
            Some(proto_coordinator_error::Err::HeldBy(holder)) => CoordinatorError::Held {
                holder: convert_node_info(holder),
            },
            Some(proto_coordinator_error::Err::LockDelayRemainingMillis(millis)) => CoordinatorError::LockDelay {
                remaining: Duration::from_millis(millis),
            },
            Some(proto_coordinator_error::Err::SessionInvalid(_)) => CoordinatorError::SessionInvalid,
            None => CoordinatorError::Unavailable("Malformed coordinator error".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Coordinator for GrpcCoordinator {
    async fn lock(&self, request: LockRequest) -> Result<LockGrant, CoordinatorError> {
        let mut client = self.client().await?;
        let rpc_request = ProtoLockReq {
            key: request.key,
            holder: Some(ProtoNodeInfo {
                hostname: request.holder.hostname,
                advertise_url: request.holder.advertise_url,
            }),
            ttl_millis: request.ttl.as_millis() as u64,
            lock_delay_millis: request.lock_delay.as_millis() as u64,
        };

        let reply = match client.lock(rpc_request).await {
            Ok(reply) => reply.into_inner(),
            Err(status) => return Err(self.on_status(status).await),
        };
        match reply.result {
            Some(proto_lock_result::Result::Ok(grant)) => Ok(LockGrant {
                session: grant.session,
                generation: grant.generation,
            }),
            Some(proto_lock_result::Result::Err(err)) => Err(Self::convert_error(Some(err))),
            None => Err(Self::convert_error(None)),
        }
    }

    async fn renew(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        let mut client = self.client().await?;
        let rpc_request = ProtoRenewReq {
            key: key.to_string(),
            session,
        };

        let reply = match client.renew(rpc_request).await {
            Ok(reply) => reply.into_inner(),
            Err(status) => return Err(self.on_status(status).await),
        };
        match reply.result {
            Some(proto_renew_result::Result::Ok(_)) => Ok(()),
            Some(proto_renew_result::Result::Err(err)) => Err(Self::convert_error(Some(err))),
            None => Err(Self::convert_error(None)),
        }
    }

    async fn unlock(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        let mut client = self.client().await?;
        let rpc_request = ProtoUnlockReq {
            key: key.to_string(),
            session,
        };

        match client.unlock(rpc_request).await {
            Ok(_) => Ok(()),
            Err(status) => Err(self.on_status(status).await),
        }
    }

    async fn holder(&self, key: &str) -> Result<Option<NodeInfo>, CoordinatorError> {
        let mut client = self.client().await?;
        let rpc_request = ProtoHolderReq { key: key.to_string() };

        match client.holder(rpc_request).await {
            Ok(reply) => Ok(reply.into_inner().holder.map(convert_node_info)),
            Err(status) => Err(self.on_status(status).await),
        }
    }
}

pub(crate) fn convert_node_info(proto: ProtoNodeInfo) -> NodeInfo {
    NodeInfo {
        hostname: proto.hostname,
        advertise_url: proto.advertise_url,
    }
}
