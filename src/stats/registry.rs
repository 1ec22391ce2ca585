use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Anything that can report a flat set of named values.
pub trait StatsSource: Send + Sync {
    fn stats(&self) -> BTreeMap<String, String>;
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("Stats are already published under '{0}'")]
    AlreadyPublished(String),
}

/// StatsRegistry collects stats sources under unique names. Callers own the registry, so
/// several nodes in one process each get their own or share one under distinct names.
/// Clones share the same set of sources.
#[derive(Clone, Default)]
pub struct StatsRegistry {
    sources: Arc<Mutex<BTreeMap<String, Arc<dyn StatsSource>>>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, name: impl Into<String>, source: Arc<dyn StatsSource>) -> Result<(), StatsError> {
        let name = name.into();
        let mut sources = self.lock();
        if sources.contains_key(&name) {
            return Err(StatsError::AlreadyPublished(name));
        }

        sources.insert(name, source);
        Ok(())
    }

    pub fn unpublish(&self, name: &str) {
        self.lock().remove(name);
    }

    /// Current values of every source, keyed by `{name}.{stat}`.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let sources: Vec<(String, Arc<dyn StatsSource>)> = self
            .lock()
            .iter()
            .map(|(name, source)| (name.clone(), source.clone()))
            .collect();

        let mut values = BTreeMap::new();
        for (name, source) in sources {
            for (stat, value) in source.stats() {
                values.insert(format!("{}.{}", name, stat), value);
            }
        }
        values
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<dyn StatsSource>>> {
        self.sources.lock().expect("StatsRegistry mutex guard poison")
    }
}
