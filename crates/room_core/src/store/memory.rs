use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{PlayerStats, StatsDelta, StatsStore, StoreError};

/// Volatile store, used when no stats file is configured.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    records: RwLock<BTreeMap<String, PlayerStats>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn get(&self, key: &str) -> Result<Option<PlayerStats>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<PlayerStats>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn put(&self, key: &str, value: &PlayerStats) -> Result<(), StoreError> {
        self.records.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn increment(&self, key: &str, delta: &StatsDelta) -> Result<PlayerStats, StoreError> {
        let mut records = self.records.write().await;
        let stats = records.entry(key.to_string()).or_insert_with(|| PlayerStats::new(key));
        stats.add(delta);
        Ok(stats.clone())
    }
}
