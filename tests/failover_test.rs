mod common;

use bytes::Bytes;
use common::{
    create_root_logger_for_stdout, wait_for_position, wait_for_primary, wait_until, CountingConnector, Partitionable,
    RecordingInvalidator, RecordingSnapshotter, Revocable,
};
use leasedb::{
    CommitError, CoordinatedLeaser, Coordinator, Invalidator, Leaser, LocalNetwork, MemoryCoordinator, NodeInfo,
    Position, ReplicationConnector, Snapshotter, StaticLeaser, Store, StoreConfig, StoreOptions, StoreRole,
};
use std::error::Error;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

const TTL: Duration = Duration::from_millis(800);
const LOCK_DELAY: Duration = Duration::from_millis(400);
const TIMEOUT: Duration = Duration::from_secs(10);

fn options() -> StoreOptions {
    StoreOptions {
        renew_interval: Some(Duration::from_millis(200)),
        reconnect_backoff_min: Some(Duration::from_millis(20)),
        reconnect_backoff_max: Some(Duration::from_millis(200)),
        release_timeout: Some(Duration::from_millis(200)),
        ..StoreOptions::default()
    }
}

fn url(hostname: &str) -> String {
    format!("local://{}", hostname)
}

struct TestNode {
    store: Store,
    invalidator: Arc<RecordingInvalidator>,
    snapshotter: Arc<RecordingSnapshotter>,
}

fn open_node(
    network: &LocalNetwork,
    hostname: &str,
    candidate: bool,
    coordinator: Arc<dyn Coordinator>,
    options: StoreOptions,
) -> TestNode {
    let logger = create_root_logger_for_stdout(hostname);
    let leaser = CoordinatedLeaser::new(logger.clone(), coordinator, "leasedb/primary", TTL, LOCK_DELAY);
    open_with_leaser(network, hostname, candidate, Arc::new(leaser), options)
}

fn open_with_leaser(
    network: &LocalNetwork,
    hostname: &str,
    candidate: bool,
    leaser: Arc<dyn Leaser>,
    options: StoreOptions,
) -> TestNode {
    open_with_connector(network, Arc::new(network.clone()), hostname, candidate, leaser, options, true)
}

fn open_with_connector(
    network: &LocalNetwork,
    connector: Arc<dyn ReplicationConnector>,
    hostname: &str,
    candidate: bool,
    leaser: Arc<dyn Leaser>,
    options: StoreOptions,
    with_snapshots: bool,
) -> TestNode {
    let invalidator = Arc::new(RecordingInvalidator::default());
    let snapshotter = Arc::new(RecordingSnapshotter::default());
    let store = Store::open(
        create_root_logger_for_stdout(hostname),
        StoreConfig {
            hostname: hostname.to_string(),
            advertise_url: url(hostname),
            candidate,
            leaser,
            connector,
            invalidator: Some(invalidator.clone() as Arc<dyn Invalidator>),
            snapshotter: if with_snapshots {
                Some(snapshotter.clone() as Arc<dyn Snapshotter>)
            } else {
                None
            },
            options,
        },
    )
    .expect("Valid options");
    network.register(url(hostname), store.producer());

    TestNode {
        store,
        invalidator,
        snapshotter,
    }
}

fn other<'a>(primary: &Store, a: &'a TestNode, b: &'a TestNode) -> &'a TestNode {
    if primary.node().hostname == a.store.node().hostname {
        b
    } else {
        a
    }
}

#[tokio::test]
async fn replica_applies_commits_in_order() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let coordinator: Arc<dyn Coordinator> = Arc::new(MemoryCoordinator::new());
    let a = open_node(&network, "node-a", true, coordinator.clone(), options());
    let b = open_node(&network, "node-b", true, coordinator, options());

    let primary = wait_for_primary(&[&a.store, &b.store], TIMEOUT).await;
    let replica = other(primary, &a, &b);

    let mut positions = Vec::new();
    for i in 1..=5 {
        positions.push(primary.commit("app.db", Bytes::from(format!("tx-{}", i))).await?);
    }
    assert_eq!(positions.iter().map(|p| p.sequence).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

    wait_for_position(&replica.store, "app.db", 5, TIMEOUT).await;
    wait_until("five invalidations", TIMEOUT, || replica.invalidator.positions().len() == 5).await;

    let expected: Vec<(String, Position)> = positions.into_iter().map(|p| ("app.db".to_string(), p)).collect();
    assert_eq!(replica.invalidator.positions(), expected);
    assert!(replica.store.ready().is_ready());
    assert_eq!(
        replica.store.role(),
        StoreRole::Replica {
            primary: primary.node().clone()
        }
    );

    let rejected = replica.store.commit("app.db", Bytes::from("nope")).await;
    assert_eq!(
        rejected,
        Err(CommitError::NotPrimary {
            primary: Some(primary.node().clone())
        })
    );

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn partitioned_primary_steps_down_and_replica_takes_over() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let backend: Arc<dyn Coordinator> = Arc::new(MemoryCoordinator::new());
    let a_link = Arc::new(Partitionable::new(backend.clone()));
    let a = open_node(&network, "node-a", true, a_link.clone(), options());

    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;
    let b = open_node(&network, "node-b", true, backend, options());

    let first = a.store.commit("app.db", Bytes::from("before")).await?;
    wait_for_position(&b.store, "app.db", 1, TIMEOUT).await;

    let partitioned_at = Instant::now();
    a_link.set_partitioned(true);

    wait_until("node-a stepped down", TIMEOUT, || !a.store.is_primary()).await;
    let rejected = a.store.commit("app.db", Bytes::from("split-brain")).await;
    assert!(matches!(rejected, Err(CommitError::NotPrimary { .. })), "{:?}", rejected);

    wait_until("node-b is primary", TIMEOUT, || b.store.is_primary()).await;
    // The old lease had to expire, then sit out its lock-delay.
    assert!(partitioned_at.elapsed() >= LOCK_DELAY);

    let second = b.store.commit("app.db", Bytes::from("after")).await?;
    assert_eq!(second.sequence, 2);
    assert!(second.generation > first.generation);

    a_link.set_partitioned(false);
    wait_until("node-a follows node-b", TIMEOUT, || {
        a.store.role()
            == StoreRole::Replica {
                primary: b.store.node().clone(),
            }
    })
    .await;
    wait_for_position(&a.store, "app.db", 2, TIMEOUT).await;

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn closing_the_primary_hands_over_after_lock_delay() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let coordinator: Arc<dyn Coordinator> = Arc::new(MemoryCoordinator::new());
    let a = open_node(&network, "node-a", true, coordinator.clone(), options());
    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;
    let b = open_node(&network, "node-b", true, coordinator, options());

    a.store.commit("app.db", Bytes::from("x")).await?;
    wait_for_position(&b.store, "app.db", 1, TIMEOUT).await;

    let closed_at = Instant::now();
    a.store.close().await;

    wait_until("node-b is primary", TIMEOUT, || b.store.is_primary()).await;
    assert!(closed_at.elapsed() >= LOCK_DELAY);
    // Well before the old lease would have expired on its own.
    assert!(closed_at.elapsed() < TTL + LOCK_DELAY + Duration::from_secs(2));

    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn static_cluster_replicates_from_pinned_primary() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let primary_info = NodeInfo::new("node-a", url("node-a"));
    let a = open_with_leaser(
        &network,
        "node-a",
        true,
        Arc::new(StaticLeaser::new(true, primary_info.clone())),
        options(),
    );
    let b = open_with_leaser(
        &network,
        "node-b",
        false,
        Arc::new(StaticLeaser::new(false, primary_info.clone())),
        options(),
    );

    let mut ready = a.store.ready();
    tokio::time::timeout(TIMEOUT, ready.wait()).await?;
    for i in 0..3 {
        a.store.commit("app.db", Bytes::from(format!("tx-{}", i))).await?;
    }

    wait_for_position(&b.store, "app.db", 3, TIMEOUT).await;
    assert_eq!(b.store.position("app.db"), Some(Position::new(1, 3)));
    assert_eq!(
        b.store.commit("app.db", Bytes::from("x")).await,
        Err(CommitError::NotPrimary {
            primary: Some(primary_info)
        })
    );

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn late_replica_resyncs_from_snapshot_after_pruning() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let primary_info = NodeInfo::new("node-a", url("node-a"));
    let pruning = StoreOptions {
        retention_frames: Some(2),
        retention_monitor_interval: Some(Duration::from_millis(20)),
        ..options()
    };
    let a = open_with_leaser(
        &network,
        "node-a",
        true,
        Arc::new(StaticLeaser::new(true, primary_info.clone())),
        pruning,
    );
    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;
    for i in 0..10 {
        a.store.commit("app.db", Bytes::from(format!("tx-{}", i))).await?;
    }
    // A few sweeps, so only the newest frames remain.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let b = open_with_leaser(
        &network,
        "node-b",
        false,
        Arc::new(StaticLeaser::new(false, primary_info)),
        options(),
    );
    wait_for_position(&b.store, "app.db", 10, TIMEOUT).await;
    assert_eq!(b.snapshotter.restored(), vec![("app.db".to_string(), Position::new(1, 10))]);
    assert_eq!(b.invalidator.databases(), vec!["app.db".to_string()]);

    a.store.commit("app.db", Bytes::from("tx-10")).await?;
    wait_for_position(&b.store, "app.db", 11, TIMEOUT).await;
    wait_until("frame 11 invalidated", TIMEOUT, || {
        b.invalidator.positions() == vec![("app.db".to_string(), Position::new(1, 11))]
    })
    .await;

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn dropped_stream_resumes_at_the_applied_position() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let primary_info = NodeInfo::new("node-a", url("node-a"));
    let a = open_with_leaser(
        &network,
        "node-a",
        true,
        Arc::new(StaticLeaser::new(true, primary_info.clone())),
        options(),
    );
    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;

    let connector = Arc::new(CountingConnector::new(Arc::new(network.clone())));
    let b = open_with_connector(
        &network,
        connector.clone(),
        "node-b",
        false,
        Arc::new(StaticLeaser::new(false, primary_info)),
        options(),
        true,
    );

    let mut positions = Vec::new();
    for i in 0..3 {
        positions.push(a.store.commit("app.db", Bytes::from(format!("tx-{}", i))).await?);
    }
    wait_until("three invalidations", TIMEOUT, || b.invalidator.positions().len() == 3).await;
    assert_eq!(connector.connections(), 1);

    network.sever(&url("node-a"));
    for i in 3..6 {
        positions.push(a.store.commit("app.db", Bytes::from(format!("tx-{}", i))).await?);
    }

    wait_for_position(&b.store, "app.db", 6, TIMEOUT).await;
    wait_until("six invalidations", TIMEOUT, || b.invalidator.positions().len() >= 6).await;
    // Anything replayed would show up late.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let expected: Vec<(String, Position)> = positions.into_iter().map(|p| ("app.db".to_string(), p)).collect();
    assert_eq!(b.invalidator.positions(), expected);
    assert!(connector.connections() >= 2);
    assert!(b.snapshotter.restored().is_empty());
    assert!(b.invalidator.databases().is_empty());

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn revoked_session_stops_commits_until_reacquired() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let link = Arc::new(Revocable::new(Arc::new(MemoryCoordinator::new())));
    let a = open_node(&network, "node-a", true, link.clone(), options());
    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;
    let first = a.store.commit("app.db", Bytes::from("before")).await?;

    link.revoke();
    wait_until("node-a stepped down", TIMEOUT, || !a.store.is_primary()).await;
    let rejected = a.store.commit("app.db", Bytes::from("revoked")).await;
    assert!(matches!(rejected, Err(CommitError::NotPrimary { .. })), "{:?}", rejected);

    // Several renew intervals later, still fenced.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!a.store.is_primary());
    let rejected = a.store.commit("app.db", Bytes::from("still-revoked")).await;
    assert!(matches!(rejected, Err(CommitError::NotPrimary { .. })), "{:?}", rejected);
    assert_eq!(a.store.position("app.db"), Some(first));

    link.restore();
    wait_until("node-a is primary again", TIMEOUT, || a.store.is_primary()).await;
    let second = a.store.commit("app.db", Bytes::from("after")).await?;
    assert_eq!(second.sequence, 2);
    assert!(second.generation > first.generation);

    a.store.close().await;
    Ok(())
}

#[tokio::test]
async fn failing_replication_keeps_backing_off() -> Result<(), Box<dyn Error>> {
    let network = LocalNetwork::new();
    let primary_info = NodeInfo::new("node-a", url("node-a"));
    let pruning = StoreOptions {
        retention_frames: Some(2),
        retention_monitor_interval: Some(Duration::from_millis(20)),
        ..options()
    };
    let a = open_with_leaser(
        &network,
        "node-a",
        true,
        Arc::new(StaticLeaser::new(true, primary_info.clone())),
        pruning,
    );
    wait_until("node-a is primary", TIMEOUT, || a.store.is_primary()).await;
    for i in 0..10 {
        a.store.commit("app.db", Bytes::from(format!("tx-{}", i))).await?;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Without a snapshotter the replica can never catch up on pruned history.
    let connector = Arc::new(CountingConnector::new(Arc::new(network.clone())));
    let b = open_with_connector(
        &network,
        connector.clone(),
        "node-b",
        false,
        Arc::new(StaticLeaser::new(false, primary_info)),
        StoreOptions {
            reconnect_backoff_max: Some(Duration::from_secs(2)),
            ..options()
        },
        false,
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    // Resetting to the 20ms floor after every failure would reconnect dozens of times.
    let attempts = connector.connections();
    assert!(attempts >= 2, "{} attempts", attempts);
    assert!(attempts <= 10, "{} attempts", attempts);
    assert_eq!(b.store.position("app.db").map(|p| p.sequence).unwrap_or(0), 0);

    a.store.close().await;
    b.store.close().await;
    Ok(())
}

#[tokio::test]
async fn renew_interval_must_be_shorter_than_the_lease_ttl() {
    let network = LocalNetwork::new();
    let logger = create_root_logger_for_stdout("node-a");
    let coordinator: Arc<dyn Coordinator> = Arc::new(MemoryCoordinator::new());
    let open = |renew_interval: Duration| {
        Store::open(
            logger.clone(),
            StoreConfig {
                hostname: "node-a".to_string(),
                advertise_url: url("node-a"),
                candidate: true,
                leaser: Arc::new(CoordinatedLeaser::new(
                    logger.clone(),
                    coordinator.clone(),
                    "leasedb/primary",
                    TTL,
                    LOCK_DELAY,
                )),
                connector: Arc::new(network.clone()),
                invalidator: None,
                snapshotter: None,
                options: StoreOptions {
                    renew_interval: Some(renew_interval),
                    ..options()
                },
            },
        )
    };

    assert!(open(TTL).is_err());
    assert!(open(Duration::from_secs(5)).is_err());

    let store = open(TTL / 4).expect("Renewals fit in the TTL");
    store.close().await;
}
