use std::convert::TryFrom;
use tokio::time::Duration;

/// Tuning knobs of a store. Unset fields take their defaults.
#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    pub renew_interval: Option<Duration>,
    pub reconnect_backoff_min: Option<Duration>,
    pub reconnect_backoff_max: Option<Duration>,
    pub retention: Option<Duration>,
    /// Keep at most this many of the newest frames per database, on top of the time horizon.
    pub retention_frames: Option<usize>,
    pub retention_monitor_interval: Option<Duration>,
    pub release_timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
#[error("Illegal store options: {0}")]
pub struct StoreOptionsError(&'static str);

#[derive(Clone, Debug)]
pub(crate) struct StoreOptionsValidated {
    pub(crate) renew_interval: Duration,
    pub(crate) reconnect_backoff_min: Duration,
    pub(crate) reconnect_backoff_max: Duration,
    pub(crate) retention: Duration,
    pub(crate) retention_frames: Option<usize>,
    pub(crate) retention_monitor_interval: Duration,
    pub(crate) release_timeout: Duration,
}

impl StoreOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.renew_interval == Duration::from_millis(0) {
            return Err("Renew interval must be positive");
        }
        if self.reconnect_backoff_min == Duration::from_millis(0) {
            return Err("Minimum reconnect backoff must be positive");
        }
        if self.reconnect_backoff_min > self.reconnect_backoff_max {
            return Err("Minimum reconnect backoff must not exceed the maximum");
        }
        if self.retention_monitor_interval == Duration::from_millis(0) {
            return Err("Retention monitor interval must be positive");
        }
        if self.retention_frames == Some(0) {
            return Err("Retention frame horizon must keep at least one frame");
        }

        Ok(())
    }
}

impl StoreOptionsValidated {
    /// Renewals have to land before an expiring lease runs out.
    pub(crate) fn check_lease_ttl(&self, ttl: Option<Duration>) -> Result<(), StoreOptionsError> {
        match ttl {
            Some(ttl) if self.renew_interval >= ttl => {
                Err(StoreOptionsError("Renew interval must be shorter than the lease TTL"))
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<StoreOptions> for StoreOptionsValidated {
    type Error = StoreOptionsError;

    fn try_from(options: StoreOptions) -> Result<Self, Self::Error> {
        let values = StoreOptionsValidated {
            renew_interval: options.renew_interval.unwrap_or(Duration::from_secs(5)),
            reconnect_backoff_min: options.reconnect_backoff_min.unwrap_or(Duration::from_millis(100)),
            reconnect_backoff_max: options.reconnect_backoff_max.unwrap_or(Duration::from_secs(5)),
            retention: options.retention.unwrap_or(Duration::from_secs(10 * 60)),
            retention_frames: options.retention_frames,
            retention_monitor_interval: options.retention_monitor_interval.unwrap_or(Duration::from_secs(60)),
            release_timeout: options.release_timeout.unwrap_or(Duration::from_secs(1)),
        };

        values.validate().map_err(StoreOptionsError)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = StoreOptionsValidated::try_from(StoreOptions::default()).unwrap();
        assert_eq!(options.renew_interval, Duration::from_secs(5));
        assert_eq!(options.retention, Duration::from_secs(600));
        assert_eq!(options.retention_monitor_interval, Duration::from_secs(60));
        assert_eq!(options.retention_frames, None);
    }

    #[test]
    fn inverted_backoff_is_rejected() {
        let options = StoreOptions {
            reconnect_backoff_min: Some(Duration::from_secs(10)),
            reconnect_backoff_max: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        assert!(StoreOptionsValidated::try_from(options).is_err());

        let options = StoreOptions {
            retention_frames: Some(0),
            ..Default::default()
        };
        assert!(StoreOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn renew_interval_must_fit_in_the_lease_ttl() {
        let options = StoreOptionsValidated::try_from(StoreOptions {
            renew_interval: Some(Duration::from_secs(10)),
            ..Default::default()
        })
        .unwrap();

        assert!(options.check_lease_ttl(Some(Duration::from_secs(10))).is_err());
        assert!(options.check_lease_ttl(Some(Duration::from_secs(11))).is_ok());
        assert!(options.check_lease_ttl(None).is_ok());
    }
}
