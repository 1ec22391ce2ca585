use crate::database::Position;
use bytes::Bytes;
use std::io;

/// Invalidator is how the filesystem layer learns that replicated state changed underneath
/// it. Calls happen on replication tasks, only after a frame was applied completely.
pub trait Invalidator: Send + Sync {
    fn invalidate_position(&self, database: &str, position: Position);

    /// The whole database was replaced by a snapshot.
    fn invalidate_database(&self, database: &str) {
        let _ = database;
    }
}

/// Snapshotter takes and restores full database images for replicas that can no longer
/// resume incrementally.
pub trait Snapshotter: Send + Sync {
    fn snapshot(&self, database: &str) -> io::Result<Bytes>;

    fn restore(&self, database: &str, position: Position, image: Bytes) -> io::Result<()>;
}
