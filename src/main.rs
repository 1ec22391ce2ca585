use bytes::Bytes;
use leasedb::{
    run_coordinator_server, try_create_node, CoordinatorLeaseConfig, MemoryCoordinator, Node, NodeConfig,
    StatsRegistry, StoreOptions,
};
use slog::Drain;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger();
    let coordinator = run_coordinator_server(
        logger.new(slog::o!("Node" => "coordinator")),
        ([127, 0, 0, 1], 7100).into(),
        Arc::new(MemoryCoordinator::new()),
    )
    .await?;

    let stats = StatsRegistry::new();
    let a = try_create_node(local_node_config(&logger, "node-a", 7101), &stats).await?;
    let b = try_create_node(local_node_config(&logger, "node-b", 7102), &stats).await?;

    let primary = wait_for_primary(&a, &b).await;
    for i in 0..5 {
        let position = primary.store().commit("demo.db", Bytes::from(format!("tx-{}", i))).await?;
        slog::info!(logger, "Committed {}", position);
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    for (stat, value) in stats.snapshot() {
        slog::info!(logger, "{} = {}", stat, value);
    }

    a.close().await;
    b.close().await;
    coordinator.stop().await;
    Ok(())
}

async fn wait_for_primary<'a>(a: &'a Node, b: &'a Node) -> &'a Node {
    loop {
        if a.store().is_primary() {
            return a;
        }
        if b.store().is_primary() {
            return b;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn local_node_config(logger: &slog::Logger, hostname: &str, port: u16) -> NodeConfig {
    NodeConfig {
        hostname: hostname.to_string(),
        mount_dir: PathBuf::from(format!("/tmp/leasedb/{}/mnt", hostname)),
        data_dir: PathBuf::from(format!("/tmp/leasedb/{}/data", hostname)),
        candidate: true,
        listen_addr: ([127, 0, 0, 1], port).into(),
        advertise_url: Some(format!("http://127.0.0.1:{}", port)),
        coordinator_lease: Some(CoordinatorLeaseConfig::new("http://127.0.0.1:7100")),
        static_lease: None,
        invalidator: None,
        snapshotter: None,
        info_logger: logger.clone(),
        options: StoreOptions::default(),
    }
}

fn create_root_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
