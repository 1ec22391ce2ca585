use crate::api::options::StoreOptionsValidated;
use crate::api::{StoreOptions, StoreOptionsError};
use crate::lease::{DEFAULT_LEASE_KEY, DEFAULT_LEASE_TTL, DEFAULT_LOCK_DELAY};
use crate::replication::{Invalidator, Snapshotter};
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;

/// Contend for the primary lease on a coordinator reachable at `url`.
#[derive(Clone, Debug)]
pub struct CoordinatorLeaseConfig {
    pub url: String,
    pub key: String,
    pub ttl: Duration,
    pub lock_delay: Duration,
}

impl CoordinatorLeaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        CoordinatorLeaseConfig {
            url: url.into(),
            key: DEFAULT_LEASE_KEY.to_string(),
            ttl: DEFAULT_LEASE_TTL,
            lock_delay: DEFAULT_LOCK_DELAY,
        }
    }
}

/// Pin the primary. On the primary itself, `primary_hostname` must be this node's hostname.
#[derive(Clone, Debug)]
pub struct StaticLeaseConfig {
    pub primary: bool,
    pub primary_hostname: String,
    pub primary_advertise_url: String,
}

pub struct NodeConfig {
    pub hostname: String,
    /// Where the filesystem layer exposes the databases.
    pub mount_dir: PathBuf,
    /// Where the filesystem layer keeps its own state.
    pub data_dir: PathBuf,
    pub candidate: bool,
    /// Address the replication server binds to.
    pub listen_addr: SocketAddr,
    /// Defaults to `http://{hostname}:{listen port}`.
    pub advertise_url: Option<String>,
    pub coordinator_lease: Option<CoordinatorLeaseConfig>,
    pub static_lease: Option<StaticLeaseConfig>,
    pub invalidator: Option<Arc<dyn Invalidator>>,
    pub snapshotter: Option<Arc<dyn Snapshotter>>,
    pub info_logger: slog::Logger,
    pub options: StoreOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Hostname required")]
    MissingHostname,
    #[error("Mount directory required")]
    MissingMountDir,
    #[error("Data directory required")]
    MissingDataDir,
    #[error("Mount directory and data directory must differ: {0:?}")]
    SameMountAndDataDir(PathBuf),
    #[error("Exactly one lease mode required, none configured")]
    NoLeaseMode,
    #[error("Exactly one lease mode required, both coordinator and static configured")]
    MultipleLeaseModes,
    #[error("Static primary hostname required")]
    MissingStaticPrimary,
    #[error("Static primary hostname '{configured}' is not this node '{hostname}'")]
    StaticPrimaryMismatch { configured: String, hostname: String },
    #[error("Renew interval {renew:?} must be shorter than lease TTL {ttl:?}")]
    RenewNotShorterThanTtl { renew: Duration, ttl: Duration },
    #[error(transparent)]
    Options(#[from] StoreOptionsError),
}

pub(crate) enum LeaseMode<'a> {
    Coordinator(&'a CoordinatorLeaseConfig),
    Static(&'a StaticLeaseConfig),
}

impl NodeConfig {
    /// Checks everything that would make the node fail at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::MissingHostname);
        }
        if self.mount_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingMountDir);
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDataDir);
        }
        if self.mount_dir == self.data_dir {
            return Err(ConfigError::SameMountAndDataDir(self.mount_dir.clone()));
        }

        let options = StoreOptionsValidated::try_from(self.options.clone())?;
        match self.lease_mode()? {
            LeaseMode::Coordinator(lease) => {
                if options.renew_interval >= lease.ttl {
                    return Err(ConfigError::RenewNotShorterThanTtl {
                        renew: options.renew_interval,
                        ttl: lease.ttl,
                    });
                }
            }
            LeaseMode::Static(lease) => {
                if lease.primary_hostname.is_empty() {
                    return Err(ConfigError::MissingStaticPrimary);
                }
                if lease.primary && lease.primary_hostname != self.hostname {
                    return Err(ConfigError::StaticPrimaryMismatch {
                        configured: lease.primary_hostname.clone(),
                        hostname: self.hostname.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub(crate) fn lease_mode(&self) -> Result<LeaseMode<'_>, ConfigError> {
        match (&self.coordinator_lease, &self.static_lease) {
            (Some(lease), None) => Ok(LeaseMode::Coordinator(lease)),
            (None, Some(lease)) => Ok(LeaseMode::Static(lease)),
            (None, None) => Err(ConfigError::NoLeaseMode),
            (Some(_), Some(_)) => Err(ConfigError::MultipleLeaseModes),
        }
    }

    pub fn advertise_url(&self) -> String {
        match &self.advertise_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.hostname, self.listen_addr.port()),
        }
    }
}
