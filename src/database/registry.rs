use crate::database::{Database, Position};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// DatabaseRegistry is the in-memory catalog of every replicated database on this node.
/// Entries are created on first write (primary) or first sight in the primary's catalog
/// (replica) and live for the rest of the process.
pub(crate) struct DatabaseRegistry {
    databases: Mutex<BTreeMap<String, Arc<Database>>>,
    // Bumped whenever a database is added, so catalog watchers can re-list.
    catalog_version: watch::Sender<u64>,
    _catalog_rx: watch::Receiver<u64>,
}

impl DatabaseRegistry {
    pub(crate) fn new() -> Self {
        let (catalog_version, catalog_rx) = watch::channel(0);

        DatabaseRegistry {
            databases: Mutex::new(BTreeMap::new()),
            catalog_version,
            _catalog_rx: catalog_rx,
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<Database>> {
        self.lock().get(name).cloned()
    }

    pub(crate) fn get_or_create(&self, name: &str) -> Arc<Database> {
        let mut databases = self.lock();
        if let Some(db) = databases.get(name) {
            return db.clone();
        }

        let db = Arc::new(Database::new(name));
        databases.insert(name.to_string(), db.clone());
        let version = *self.catalog_version.borrow() + 1;
        let _ = self.catalog_version.send(version);

        db
    }

    pub(crate) fn list(&self) -> Vec<Arc<Database>> {
        self.lock().values().cloned().collect()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Every database with its current position, sorted by name.
    pub(crate) fn catalog(&self) -> Vec<(String, Position)> {
        self.lock()
            .iter()
            .map(|(name, db)| (name.clone(), db.position()))
            .collect()
    }

    pub(crate) fn subscribe_catalog(&self) -> watch::Receiver<u64> {
        self.catalog_version.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Database>>> {
        self.databases.lock().expect("DatabaseRegistry mutex guard poison")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::time::Instant;

    #[test]
    fn get_or_create_returns_the_same_database() {
        let registry = DatabaseRegistry::new();
        let first = registry.get_or_create("app.db");
        first.append(1, Bytes::from("x"), Instant::now());

        let second = registry.get_or_create("app.db");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.get("other.db").is_none());
        assert_eq!(registry.catalog(), vec![("app.db".to_string(), Position::new(1, 1))]);
    }

    #[tokio::test]
    async fn catalog_watchers_see_new_databases() {
        let registry = DatabaseRegistry::new();
        let mut watcher = registry.subscribe_catalog();

        registry.get_or_create("b.db");
        watcher.changed().await.unwrap();
        registry.get_or_create("a.db");
        registry.get_or_create("a.db");
        watcher.changed().await.unwrap();

        assert_eq!(*watcher.borrow(), 2);
        assert_eq!(registry.names(), vec!["a.db".to_string(), "b.db".to_string()]);
    }
}
