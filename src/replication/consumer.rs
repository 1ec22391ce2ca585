use crate::database::{ApplyError, ApplyOutcome, Database, DatabaseRegistry, Position};
use crate::lease::NodeInfo;
use crate::replication::{
    Acknowledgement, CatalogMessage, DatabaseInfo, Invalidator, ReplicationClient, ReplicationConnector, Snapshotter, StreamErrorCode,
    StreamMessage, StreamRequest, TransportError,
};
use crate::store::ReadyNotifier;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Primary refused to stream: {0}")]
    Stream(StreamErrorCode),
    #[error("Failed to restore snapshot of '{database}': {reason}")]
    Restore { database: String, reason: String },
}

impl ReplicationError {
    /// The primary was never reached, as opposed to a session that broke after connecting.
    pub(crate) fn is_connect_failure(&self) -> bool {
        matches!(self, ReplicationError::Transport(TransportError::Unreachable { .. }))
    }
}

/// FrameConsumer is the replica side of replication: it follows one primary's catalog and
/// keeps one stream per database, applying frames strictly in order.
pub(crate) struct FrameConsumer {
    inner: Arc<ConsumerShared>,
}

struct ConsumerShared {
    logger: slog::Logger,
    hostname: String,
    registry: Arc<DatabaseRegistry>,
    connector: Arc<dyn ReplicationConnector>,
    invalidator: Option<Arc<dyn Invalidator>>,
    snapshotter: Option<Arc<dyn Snapshotter>>,
    ready: ReadyNotifier,
    // Frames applied plus snapshots restored, over the consumer's lifetime.
    progress: AtomicU64,
}

impl FrameConsumer {
    pub(crate) fn new(
        logger: slog::Logger,
        hostname: String,
        registry: Arc<DatabaseRegistry>,
        connector: Arc<dyn ReplicationConnector>,
        invalidator: Option<Arc<dyn Invalidator>>,
        snapshotter: Option<Arc<dyn Snapshotter>>,
        ready: ReadyNotifier,
    ) -> Self {
        FrameConsumer {
            inner: Arc::new(ConsumerShared {
                logger,
                hostname,
                registry,
                connector,
                invalidator,
                snapshotter,
                ready,
                progress: AtomicU64::new(0),
            }),
        }
    }

    /// Grows whenever a frame is applied or a snapshot restored. Comparing two readings tells
    /// whether replication got anywhere in between.
    pub(crate) fn progress(&self) -> u64 {
        self.inner.progress.load(Ordering::Relaxed)
    }

    /// Replicates from `primary` until the primary ends the session or something breaks.
    /// `Ok` means the primary shut down cleanly. Dropping the future stops every stream.
    pub(crate) async fn replicate(&self, primary: &NodeInfo) -> Result<(), ReplicationError> {
        let shared = &self.inner;
        let logger = shared.logger.new(slog::o!("Primary" => primary.hostname.clone()));

        let client = shared.connector.connect(&primary.advertise_url).await?;
        let mut catalog = client.watch_catalog(shared.hostname.clone()).await?;

        let databases = match Self::next_catalog(catalog.next().await)? {
            Some(databases) => databases,
            None => return Err(TransportError::Disconnected("catalog stream closed".to_string()).into()),
        };
        slog::info!(logger, "Connected to primary, {} databases", databases.len());

        let mut tasks = TaskSet::default();
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
        let mut streaming = HashSet::new();
        let mut catalog_open = true;

        tasks.push(tokio::spawn(shared.clone().wait_until_caught_up(databases.clone())));
        shared.start_streams(&client, databases, &mut streaming, &mut tasks, &exit_tx, &logger);

        loop {
            tokio::select! {
                message = catalog.next(), if catalog_open => match Self::next_catalog(message)? {
                    Some(databases) => {
                        shared.start_streams(&client, databases, &mut streaming, &mut tasks, &exit_tx, &logger);
                    }
                    // Frame streams tell whether the primary went away or ended cleanly.
                    None => catalog_open = false,
                },
                exit = exit_rx.recv() => match exit {
                    Some((database, Ok(()))) => {
                        slog::info!(logger, "Primary ended stream for '{}', leaving", database);
                        return Ok(());
                    }
                    Some((database, Err(e))) => {
                        slog::warn!(logger, "Stream for '{}' failed: {}", database, e);
                        return Err(e);
                    }
                    // Not while `exit_tx` is alive.
                    None => return Ok(()),
                },
            }
        }
    }

    fn next_catalog(
        message: Option<Result<CatalogMessage, TransportError>>,
    ) -> Result<Option<Vec<DatabaseInfo>>, ReplicationError> {
        match message {
            Some(Ok(CatalogMessage::Databases(databases))) => Ok(Some(databases)),
            Some(Ok(CatalogMessage::Error(code))) => Err(ReplicationError::Stream(code)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}

impl ConsumerShared {
    fn start_streams(
        self: &Arc<Self>,
        client: &Arc<dyn ReplicationClient>,
        databases: Vec<DatabaseInfo>,
        streaming: &mut HashSet<String>,
        tasks: &mut TaskSet,
        exit_tx: &mpsc::UnboundedSender<(String, Result<(), ReplicationError>)>,
        logger: &slog::Logger,
    ) {
        for info in databases {
            if !streaming.insert(info.name.clone()) {
                continue;
            }

            let db = self.registry.get_or_create(&info.name);
            slog::debug!(logger, "Streaming '{}' from {}", info.name, db.position());
            let logger = logger.new(slog::o!("Database" => info.name.clone()));
            tasks.push(tokio::spawn(self.clone().acknowledge_applied(
                logger.clone(),
                client.clone(),
                db.clone(),
            )));

            let shared = self.clone();
            let client = client.clone();
            let exit_tx = exit_tx.clone();
            tasks.push(tokio::spawn(async move {
                let result = shared.stream_database(&logger, client, &db).await;
                let _ = exit_tx.send((info.name, result));
            }));
        }
    }

    /// Reports the applied position to the primary whenever it moves. Positions that move
    /// while an acknowledgement is in flight coalesce into the next one.
    async fn acknowledge_applied(
        self: Arc<Self>,
        logger: slog::Logger,
        client: Arc<dyn ReplicationClient>,
        db: Arc<Database>,
    ) {
        let mut positions = db.subscribe();
        loop {
            let applied = *positions.borrow_and_update();
            let ack = Acknowledgement {
                database: db.name().to_string(),
                client_hostname: self.hostname.clone(),
                applied,
            };
            if let Err(e) = client.acknowledge(ack).await {
                slog::debug!(logger, "Failed to acknowledge {}: {}", applied, e);
            }
            if positions.changed().await.is_err() {
                return;
            }
        }
    }

    /// Fires readiness once every database of the first catalog listing reached the
    /// position the primary reported for it.
    async fn wait_until_caught_up(self: Arc<Self>, targets: Vec<DatabaseInfo>) {
        for target in targets {
            let db = self.registry.get_or_create(&target.name);
            let mut positions = db.subscribe();
            loop {
                let applied = *positions.borrow();
                if applied.sequence >= target.position.sequence {
                    break;
                }
                if positions.changed().await.is_err() {
                    return;
                }
            }
        }

        if self.ready.fire() {
            slog::info!(self.logger, "Caught up with primary, ready");
        }
    }

    async fn stream_database(
        &self,
        logger: &slog::Logger,
        client: Arc<dyn ReplicationClient>,
        db: &Database,
    ) -> Result<(), ReplicationError> {
        let mut resync = false;

        loop {
            let request = StreamRequest {
                database: db.name().to_string(),
                resume: db.position(),
                resync,
                client_hostname: self.hostname.clone(),
            };
            let mut stream = client.stream_frames(request).await?;

            loop {
                let message = match stream.next().await {
                    Some(message) => message?,
                    None => return Err(TransportError::Disconnected("frame stream closed".to_string()).into()),
                };

                match message {
                    StreamMessage::Frame(frame) => {
                        let position = frame.position;
                        match db.apply(frame, Instant::now()) {
                            Ok(ApplyOutcome::Applied) => {
                                self.progress.fetch_add(1, Ordering::Relaxed);
                                self.invalidate_position(db.name(), position);
                            }
                            Ok(ApplyOutcome::Duplicate) => {}
                            Err(ApplyError::Desync { applied, received }) => {
                                slog::warn!(logger, "Received {} after {}", received, applied);
                                break;
                            }
                        }
                    }
                    StreamMessage::Snapshot { position, image } => {
                        self.restore(logger, db, position, image)?;
                        resync = false;
                    }
                    StreamMessage::End => return Ok(()),
                    StreamMessage::Error(code @ StreamErrorCode::PositionTooOld)
                    | StreamMessage::Error(code @ StreamErrorCode::Desync) => {
                        slog::warn!(logger, "Primary cannot resume from {}: {}", db.position(), code);
                        break;
                    }
                    StreamMessage::Error(code) => return Err(ReplicationError::Stream(code)),
                }
            }

            if resync {
                // A snapshot request that itself ends in a resync will never converge.
                return Err(ReplicationError::Stream(StreamErrorCode::Desync));
            }
            if self.snapshotter.is_none() {
                return Err(ReplicationError::Stream(StreamErrorCode::ResyncUnavailable));
            }
            slog::warn!(logger, "Requesting full resync");
            resync = true;
        }
    }

    fn restore(&self, logger: &slog::Logger, db: &Database, position: Position, image: bytes::Bytes) -> Result<(), ReplicationError> {
        let snapshotter = self
            .snapshotter
            .as_ref()
            .ok_or(ReplicationError::Stream(StreamErrorCode::ResyncUnavailable))?;

        snapshotter
            .restore(db.name(), position, image)
            .map_err(|e| ReplicationError::Restore {
                database: db.name().to_string(),
                reason: e.to_string(),
            })?;
        db.reset(position);
        self.progress.fetch_add(1, Ordering::Relaxed);
        slog::info!(logger, "Restored snapshot at {}", position);

        if let Some(invalidator) = &self.invalidator {
            invalidator.invalidate_database(db.name());
        }
        Ok(())
    }

    fn invalidate_position(&self, database: &str, position: Position) {
        if let Some(invalidator) = &self.invalidator {
            invalidator.invalidate_position(database, position);
        }
    }
}

/// Aborts every task when dropped.
#[derive(Default)]
struct TaskSet(Vec<JoinHandle<()>>);

impl TaskSet {
    fn push(&mut self, task: JoinHandle<()>) {
        self.0.push(task);
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}
