//! Persisted player statistics.
//!
//! The store is an asynchronous key-value table keyed by registered-user id.
//! Plugins declare the tables they need during [`StoreSchema`] upgrade and
//! receive the opened store once it is ready.

pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use error::StoreError;
pub use file::FileStatsStore;
pub use memory::MemoryStatsStore;

/// Table holding [`PlayerStats`] records
pub const STATS_TABLE: &str = "stats";

/// Lifetime counters of one registered user. Only ever incremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player_id: String,
    pub nb_goals: u32,
    pub nb_own_goals: u32,
    pub nb_assists: u32,
}

impl PlayerStats {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self { player_id: player_id.into(), nb_goals: 0, nb_own_goals: 0, nb_assists: 0 }
    }

    pub fn add(&mut self, delta: &StatsDelta) {
        self.nb_goals += delta.goals;
        self.nb_own_goals += delta.own_goals;
        self.nb_assists += delta.assists;
    }
}

/// Increments produced by one match for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsDelta {
    pub goals: u32,
    pub own_goals: u32,
    pub assists: u32,
}

impl StatsDelta {
    pub fn is_empty(&self) -> bool {
        self.goals == 0 && self.own_goals == 0 && self.assists == 0
    }
}

/// Tables (and their secondary indexes) requested by plugins before the store opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSchema {
    tables: BTreeMap<String, Vec<String>>,
}

impl StoreSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table; declaring it twice merges the indexes.
    pub fn table(&mut self, name: &str, indexes: &[&str]) -> &mut Self {
        let entry = self.tables.entry(name.to_string()).or_default();
        for index in indexes {
            if !entry.iter().any(|i| i == index) {
                entry.push(index.to_string());
            }
        }
        self
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn indexes(&self, table: &str) -> &[String] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<PlayerStats>, StoreError>;
    async fn get_all(&self) -> Result<Vec<PlayerStats>, StoreError>;
    async fn put(&self, key: &str, value: &PlayerStats) -> Result<(), StoreError>;

    /// Add `delta` to one user's counters (creating the record) and return
    /// the saved value. The read, the change and the write happen under one
    /// lock, so concurrent increments never lose each other.
    async fn increment(&self, key: &str, delta: &StatsDelta) -> Result<PlayerStats, StoreError>;
}

pub type SharedStore = Arc<dyn StatsStore>;

/// Read-modify-write of one user's counters.
pub async fn increment(store: &dyn StatsStore, user_id: &str, delta: &StatsDelta) -> Result<PlayerStats, StoreError> {
    store.increment(user_id, delta).await
}
