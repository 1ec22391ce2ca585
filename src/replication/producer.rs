use crate::database::{Database, DatabaseRegistry, Frame, SessionId};
use crate::replication::{
    Acknowledgement, CatalogMessage, DatabaseInfo, Snapshotter, StreamErrorCode, StreamMessage, StreamRequest,
};
use crate::shutdown::ShutdownSignal;
use crate::store::RoleChangeListener;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

const SESSION_CHANNEL_SIZE: usize = 16;
const READ_BATCH: usize = 16;

/// FrameProducer is the serving side of replication. It only serves while the local store is
/// primary; sessions are dropped without a clean end the moment the store demotes.
#[derive(Clone)]
pub struct FrameProducer {
    inner: Arc<ProducerShared>,
}

struct ProducerShared {
    logger: slog::Logger,
    registry: Arc<DatabaseRegistry>,
    role: RoleChangeListener,
    snapshotter: Option<Arc<dyn Snapshotter>>,
    shutdown: ShutdownSignal,
}

impl FrameProducer {
    pub(crate) fn new(
        logger: slog::Logger,
        registry: Arc<DatabaseRegistry>,
        role: RoleChangeListener,
        snapshotter: Option<Arc<dyn Snapshotter>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        FrameProducer {
            inner: Arc::new(ProducerShared {
                logger,
                registry,
                role,
                snapshotter,
                shutdown,
            }),
        }
    }

    /// Streams the catalog: a full listing now and again whenever a database is added.
    pub fn watch_catalog(&self, client_hostname: String) -> mpsc::Receiver<CatalogMessage> {
        let (tx, rx) = mpsc::channel(1);
        let shared = self.inner.clone();

        if !shared.role.is_primary() {
            let _ = tx.try_send(CatalogMessage::Error(StreamErrorCode::NotPrimary));
            return rx;
        }

        slog::debug!(shared.logger, "Catalog watch from '{}'", client_hostname);
        tokio::spawn(shared.serve_catalog(tx));

        rx
    }

    /// Opens a replication session for one database. Errors are reported in-stream, as the
    /// only message, before the stream closes.
    pub fn stream_frames(&self, request: StreamRequest) -> mpsc::Receiver<StreamMessage> {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_SIZE);
        let shared = self.inner.clone();

        match shared.open_session(&request) {
            Ok((db, session_id, snapshot)) => {
                tokio::spawn(shared.serve_session(tx, db, session_id, snapshot, request.client_hostname));
            }
            Err(code) => {
                slog::info!(
                    shared.logger,
                    "Rejected stream request from '{}' for '{}' at {}: {}",
                    request.client_hostname,
                    request.database,
                    request.resume,
                    code
                );
                let _ = tx.try_send(StreamMessage::Error(code));
            }
        }

        rx
    }

    /// Lets history the replica already applied be pruned. Unknown databases are ignored.
    pub fn acknowledge(&self, ack: Acknowledgement) {
        if let Some(db) = self.inner.registry.get(&ack.database) {
            db.acknowledge(&ack.client_hostname, ack.applied);
        }
    }
}

impl ProducerShared {
    fn open_session(
        &self,
        request: &StreamRequest,
    ) -> Result<(Arc<Database>, SessionId, Option<StreamMessage>), StreamErrorCode> {
        if !self.role.is_primary() {
            return Err(StreamErrorCode::NotPrimary);
        }
        let db = self
            .registry
            .get(&request.database)
            .ok_or(StreamErrorCode::UnknownDatabase)?;

        if !request.resync {
            let session_id = db
                .register_session(request.resume, &request.client_hostname)
                .map_err(|e| StreamErrorCode::from(&e))?;
            return Ok((db, session_id, None));
        }

        let snapshotter = self.snapshotter.as_ref().ok_or(StreamErrorCode::ResyncUnavailable)?;
        match db.register_snapshot_session(&request.client_hostname, |name| snapshotter.snapshot(name)) {
            Ok((session_id, position, image)) => {
                slog::info!(
                    self.logger,
                    "Sending snapshot of '{}' at {} to '{}'",
                    request.database,
                    position,
                    request.client_hostname
                );
                Ok((db, session_id, Some(StreamMessage::Snapshot { position, image })))
            }
            Err(e) => {
                slog::warn!(self.logger, "Snapshot of '{}' failed: {:?}", request.database, e);
                Err(StreamErrorCode::ResyncUnavailable)
            }
        }
    }

    async fn serve_session(
        self: Arc<Self>,
        tx: mpsc::Sender<StreamMessage>,
        db: Arc<Database>,
        session_id: SessionId,
        snapshot: Option<StreamMessage>,
        client_hostname: String,
    ) {
        let logger = self
            .logger
            .new(slog::o!("Database" => db.name().to_string(), "Replica" => client_hostname));
        let _guard = SessionGuard {
            db: db.clone(),
            session_id,
        };
        let mut positions = db.subscribe();
        let mut role = self.role.clone();
        let mut shutdown = self.shutdown.clone();
        slog::debug!(logger, "Session opened");

        if let Some(snapshot) = snapshot {
            if tx.send(snapshot).await.is_err() {
                return;
            }
        }

        loop {
            if !role.is_primary() {
                // Ungraceful on purpose: the replica treats it like a dropped connection.
                slog::debug!(logger, "No longer primary, dropping session");
                return;
            }

            let frames = match db.read_for_session(session_id, READ_BATCH) {
                Ok(frames) => frames,
                Err(e) => {
                    slog::warn!(logger, "Session fell behind retention: {}", e);
                    let _ = tx.send(StreamMessage::Error(StreamErrorCode::from(&e))).await;
                    return;
                }
            };

            if frames.is_empty() {
                tokio::select! {
                    changed = positions.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    next_role = role.next() => {
                        if next_role.is_none() {
                            return;
                        }
                    }
                    _ = shutdown.wait() => {
                        slog::debug!(logger, "Shutting down, ending session");
                        let _ = tx.send(StreamMessage::End).await;
                        return;
                    }
                    _ = tx.closed() => {
                        slog::debug!(logger, "Replica hung up");
                        return;
                    }
                }
                continue;
            }

            if !Self::send_frames(&tx, frames, &mut shutdown).await {
                return;
            }
        }
    }

    /// Returns false when the session is over.
    async fn send_frames(tx: &mpsc::Sender<StreamMessage>, frames: Vec<Frame>, shutdown: &mut ShutdownSignal) -> bool {
        for frame in frames {
            tokio::select! {
                sent = tx.send(StreamMessage::Frame(frame)) => {
                    if sent.is_err() {
                        return false;
                    }
                }
                _ = shutdown.wait() => {
                    let _ = tx.try_send(StreamMessage::End);
                    return false;
                }
            }
        }
        true
    }

    async fn serve_catalog(self: Arc<Self>, tx: mpsc::Sender<CatalogMessage>) {
        let mut versions = self.registry.subscribe_catalog();
        let mut role = self.role.clone();
        let mut shutdown = self.shutdown.clone();

        loop {
            if !role.is_primary() {
                return;
            }
            if tx.send(CatalogMessage::Databases(self.catalog())).await.is_err() {
                return;
            }

            tokio::select! {
                changed = versions.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                next_role = role.next() => {
                    if next_role.is_none() {
                        return;
                    }
                }
                _ = shutdown.wait() => return,
                _ = tx.closed() => return,
            }
        }
    }

    fn catalog(&self) -> Vec<DatabaseInfo> {
        self.registry
            .catalog()
            .into_iter()
            .map(|(name, position)| DatabaseInfo { name, position })
            .collect()
    }
}

/// Marks the session disconnected however the serving task exits.
struct SessionGuard {
    db: Arc<Database>,
    session_id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.db.disconnect_session(self.session_id, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Position, RetentionPolicy};
    use crate::replication::{LocalNetwork, ReplicationClient, ReplicationConnector};
    use crate::shutdown::{shutdown_signal, ShutdownHandle};
    use crate::store::{role_channel, RoleChangeNotifier, RoleSnapshot};
    use bytes::Bytes;
    use tokio::time::Duration;

    struct Harness {
        producer: FrameProducer,
        registry: Arc<DatabaseRegistry>,
        role: RoleChangeNotifier,
        shutdown: Option<ShutdownHandle>,
    }

    impl Harness {
        fn new(initial_role: RoleSnapshot) -> Self {
            let registry = Arc::new(DatabaseRegistry::new());
            let (role, listener) = role_channel(initial_role);
            let (shutdown, signal) = shutdown_signal();
            let logger = slog::Logger::root(slog::Discard, slog::o!());
            let producer = FrameProducer::new(logger, registry.clone(), listener, None, signal);

            Harness {
                producer,
                registry,
                role,
                shutdown: Some(shutdown),
            }
        }

        fn commit(&self, database: &str, count: u64) {
            let db = self.registry.get_or_create(database);
            for i in 0..count {
                db.append(1, Bytes::from(format!("tx-{}", i)), Instant::now());
            }
        }
    }

    fn request(database: &str, resume: Position) -> StreamRequest {
        StreamRequest {
            database: database.to_string(),
            resume,
            resync: false,
            client_hostname: "replica-1".to_string(),
        }
    }

    async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> Option<T> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("Unexpected timeout")
    }

    async fn recv_sequence(rx: &mut mpsc::Receiver<StreamMessage>) -> u64 {
        match recv(rx).await {
            Some(StreamMessage::Frame(frame)) => frame.position.sequence,
            other => panic!("Expected frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn streams_backlog_then_live_commits_in_order() {
        let harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("app.db", 3);

        let mut rx = harness.producer.stream_frames(request("app.db", Position::ZERO));
        for expected in 1..=3 {
            assert_eq!(recv_sequence(&mut rx).await, expected);
        }

        harness.commit("app.db", 2);
        assert_eq!(recv_sequence(&mut rx).await, 4);
        assert_eq!(recv_sequence(&mut rx).await, 5);
    }

    #[tokio::test]
    async fn rejects_requests_it_cannot_serve() {
        let harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("app.db", 2);

        let mut rx = harness.producer.stream_frames(request("missing.db", Position::ZERO));
        assert_eq!(recv(&mut rx).await, Some(StreamMessage::Error(StreamErrorCode::UnknownDatabase)));
        assert_eq!(recv(&mut rx).await, None);

        let mut rx = harness.producer.stream_frames(request("app.db", Position::new(1, 9)));
        assert_eq!(recv(&mut rx).await, Some(StreamMessage::Error(StreamErrorCode::Desync)));

        let mut resync = request("app.db", Position::ZERO);
        resync.resync = true;
        let mut rx = harness.producer.stream_frames(resync);
        assert_eq!(
            recv(&mut rx).await,
            Some(StreamMessage::Error(StreamErrorCode::ResyncUnavailable))
        );
    }

    #[tokio::test]
    async fn replicas_are_turned_away() {
        let replica_of = crate::lease::NodeInfo::new("other", "http://other:20202");
        let harness = Harness::new(RoleSnapshot::Replica(replica_of));
        harness.commit("app.db", 1);

        let mut rx = harness.producer.stream_frames(request("app.db", Position::ZERO));
        assert_eq!(recv(&mut rx).await, Some(StreamMessage::Error(StreamErrorCode::NotPrimary)));

        let mut catalog = harness.producer.watch_catalog("replica-1".to_string());
        assert_eq!(
            recv(&mut catalog).await,
            Some(CatalogMessage::Error(StreamErrorCode::NotPrimary))
        );
    }

    #[tokio::test]
    async fn demotion_drops_sessions_without_end() {
        let harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("app.db", 1);

        let mut rx = harness.producer.stream_frames(request("app.db", Position::ZERO));
        assert_eq!(recv_sequence(&mut rx).await, 1);

        harness.role.notify_new_role(RoleSnapshot::Initializing);
        assert_eq!(recv(&mut rx).await, None);

        let db = harness.registry.get("app.db").unwrap();
        assert!(db.live_sessions().is_empty());
    }

    #[tokio::test]
    async fn shutdown_ends_sessions_cleanly() {
        let mut harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("app.db", 1);

        let mut rx = harness.producer.stream_frames(request("app.db", Position::ZERO));
        assert_eq!(recv_sequence(&mut rx).await, 1);

        harness.shutdown.take();
        assert_eq!(recv(&mut rx).await, Some(StreamMessage::End));
        assert_eq!(recv(&mut rx).await, None);
    }

    #[tokio::test]
    async fn catalog_lists_new_databases() {
        let harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("a.db", 2);

        let mut catalog = harness.producer.watch_catalog("replica-1".to_string());
        assert_eq!(
            recv(&mut catalog).await,
            Some(CatalogMessage::Databases(vec![DatabaseInfo {
                name: "a.db".to_string(),
                position: Position::new(1, 2),
            }]))
        );

        harness.commit("b.db", 1);
        match recv(&mut catalog).await {
            Some(CatalogMessage::Databases(databases)) => {
                let names: Vec<&str> = databases.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, vec!["a.db", "b.db"]);
            }
            other => panic!("Unexpected catalog message {:?}", other),
        }
    }

    #[tokio::test]
    async fn stalled_replica_keeps_its_unapplied_frames() {
        let harness = Harness::new(RoleSnapshot::Primary);
        harness.commit("app.db", 100);
        let network = LocalNetwork::new();
        network.register("local://primary", harness.producer.clone());
        let client = network.connect("local://primary").await.unwrap();
        let policy = RetentionPolicy {
            duration: Duration::from_secs(600),
            max_frames: None,
        };
        let much_later = Instant::now() + Duration::from_secs(3600);

        let mut stream = client.stream_frames(request("app.db", Position::ZERO)).await.unwrap();
        for expected in 1..=14 {
            match stream.next().await {
                Some(Ok(StreamMessage::Frame(frame))) => assert_eq!(frame.position.sequence, expected),
                other => panic!("Expected frame {}, got {:?}", expected, other),
            }
        }
        // Let the session read ahead and fill every buffer between it and the replica.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let db = harness.registry.get("app.db").unwrap();
        db.enforce_retention(much_later, &policy);
        assert_eq!(db.boundary(), Position::ZERO);

        client
            .acknowledge(Acknowledgement {
                database: "app.db".to_string(),
                client_hostname: "replica-1".to_string(),
                applied: Position::new(1, 14),
            })
            .await
            .unwrap();
        db.enforce_retention(much_later, &policy);
        assert_eq!(db.boundary(), Position::new(1, 14));

        // The stalled stream carries on without a gap.
        match stream.next().await {
            Some(Ok(StreamMessage::Frame(frame))) => assert_eq!(frame.position.sequence, 15),
            other => panic!("Expected frame 15, got {:?}", other),
        }
    }
}
