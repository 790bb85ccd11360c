//! JSON-file stats store.
//!
//! The whole document is small (one record per registered user), so every
//! write rewrites it: serialize, write to a temp file, fsync, rename.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{PlayerStats, StatsDelta, StatsStore, StoreError, StoreSchema, STATS_TABLE};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    /// Declared secondary indexes, kept for readers of the raw file
    #[serde(default)]
    indexes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<String, PlayerStats>>,
}

pub struct FileStatsStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl FileStatsStore {
    /// Open (or create) the store and add any table the schema declares.
    pub async fn open(path: impl AsRef<Path>, schema: &StoreSchema) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut document = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreDocument>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Creating stats store at {:?}", path);
                StoreDocument { version: STORE_VERSION, ..StoreDocument::default() }
            }
            Err(e) => return Err(e.into()),
        };

        let mut upgraded = false;
        for table in schema.tables() {
            if !document.tables.contains_key(table) {
                log::info!("Stats store upgrade: creating table '{}'", table);
                document.tables.insert(table.to_string(), BTreeMap::new());
                upgraded = true;
            }
            let indexes = schema.indexes(table).to_vec();
            if document.indexes.get(table) != Some(&indexes) {
                document.indexes.insert(table.to_string(), indexes);
                upgraded = true;
            }
        }
        if document.version < STORE_VERSION {
            document.version = STORE_VERSION;
            upgraded = true;
        }

        if upgraded {
            Self::write_document(&path, &document).await?;
        }
        log::debug!("Stats store ready ({} tables)", document.tables.len());

        Ok(Self { path, document: Mutex::new(document) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_document(path: &Path, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(document)?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&temp_path, path).await?;

        log::debug!("Saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    /// Write `document` with `record` stored under `key`, then adopt it in
    /// memory. A failed write leaves the in-memory copy as it was on disk.
    async fn save_record(
        &self,
        document: &mut StoreDocument,
        key: &str,
        record: PlayerStats,
    ) -> Result<(), StoreError> {
        let mut next = document.clone();
        next.tables
            .get_mut(STATS_TABLE)
            .ok_or_else(Self::missing)?
            .insert(key.to_string(), record);
        Self::write_document(&self.path, &next).await?;
        *document = next;
        Ok(())
    }

    fn missing() -> StoreError {
        StoreError::MissingTable { table: STATS_TABLE.to_string() }
    }
}

#[async_trait]
impl StatsStore for FileStatsStore {
    async fn get(&self, key: &str) -> Result<Option<PlayerStats>, StoreError> {
        let document = self.document.lock().await;
        let table = document.tables.get(STATS_TABLE).ok_or_else(Self::missing)?;
        Ok(table.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<PlayerStats>, StoreError> {
        let document = self.document.lock().await;
        let table = document.tables.get(STATS_TABLE).ok_or_else(Self::missing)?;
        Ok(table.values().cloned().collect())
    }

    async fn put(&self, key: &str, value: &PlayerStats) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        self.save_record(&mut document, key, value.clone()).await
    }

    async fn increment(&self, key: &str, delta: &StatsDelta) -> Result<PlayerStats, StoreError> {
        let mut document = self.document.lock().await;
        let table = document.tables.get(STATS_TABLE).ok_or_else(Self::missing)?;
        let mut stats = table.get(key).cloned().unwrap_or_else(|| PlayerStats::new(key));
        stats.add(delta);
        self.save_record(&mut document, key, stats.clone()).await?;
        Ok(stats)
    }
}
