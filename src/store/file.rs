// store/file.rs
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::transaction::ConfirmedTransaction;
use crate::store::TransactionStore;

/// Fallback store used when MongoDB is not configured or unreachable.
/// Records live in memory behind an RwLock (the write guard serializes
/// concurrent appends) and are mirrored to a single JSON array on disk
/// when a path is configured.
pub struct FileStore {
    path: Option<PathBuf>,
    records: RwLock<Vec<ConfirmedTransaction>>,
}

impl FileStore {
    /// Loads existing records from `path` if the file exists. With no path
    /// the store is memory-only and records do not survive a restart.
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let records = match &path {
            Some(p) if p.exists() => {
                let raw = tokio::fs::read(p).await?;
                let parsed: Vec<ConfirmedTransaction> = serde_json::from_slice(&raw)?;
                info!(file = %p.display(), count = parsed.len(), "loaded transaction file");
                parsed
            }
            Some(p) => {
                info!(file = %p.display(), "transaction file absent, starting empty");
                Vec::new()
            }
            None => {
                warn!("no transaction file configured, records are in-memory only");
                Vec::new()
            }
        };

        Ok(FileStore {
            path,
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &[ConfirmedTransaction]) -> Result<()> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_vec_pretty(records)?;
            tokio::fs::write(path, raw).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for FileStore {
    async fn append(&self, tx: ConfirmedTransaction) -> Result<()> {
        let mut records = self.records.write().await;

        if records.iter().any(|existing| existing.id == tx.id) {
            info!(id = %tx.id, "transaction already recorded, skipping duplicate delivery");
            return Ok(());
        }

        info!(id = %tx.id, amount = tx.amount, "transaction recorded");
        records.push(tx);
        self.persist(&records).await
    }

    async fn list_all(&self) -> Result<Vec<ConfirmedTransaction>> {
        let records = self.records.read().await;
        let mut out = records.clone();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(out)
    }

    fn backend(&self) -> &'static str {
        if self.path.is_some() {
            "file"
        } else {
            "memory"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::NO_EMAIL;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    fn tx(id: &str, amount: i64) -> ConfirmedTransaction {
        ConfirmedTransaction {
            id: id.into(),
            amount,
            currency: "usd".into(),
            customer_email: NO_EMAIL.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn append_is_idempotent_by_id() {
        let store = FileStore::load(None).await.unwrap();

        store.append(tx("pi_1", 1234)).await.unwrap();
        store.append(tx("pi_1", 9999)).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        // First writer wins.
        assert_eq!(all[0].amount, 1234);
    }

    #[tokio::test]
    async fn list_all_orders_by_timestamp_ascending() {
        let store = FileStore::load(None).await.unwrap();

        let mut older = tx("pi_old", 100);
        older.timestamp = Utc::now() - Duration::hours(1);
        let newer = tx("pi_new", 200);

        store.append(newer).await.unwrap();
        store.append(older).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].id, "pi_old");
        assert_eq!(all[1].id, "pi_new");
    }

    #[tokio::test]
    async fn records_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");

        {
            let store = FileStore::load(Some(path.clone())).await.unwrap();
            store.append(tx("pi_1", 1234)).await.unwrap();
            store.append(tx("pi_2", 500)).await.unwrap();
        }

        let reloaded = FileStore::load(Some(path)).await.unwrap();
        let all = reloaded.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|t| t.id == "pi_1" && t.amount == 1234));
    }

    #[tokio::test]
    async fn file_format_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");

        let store = FileStore::load(Some(path.clone())).await.unwrap();
        store.append(tx("pi_1", 1234)).await.unwrap();

        let raw = std::fs::read(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert!(parsed.is_array());
        assert_eq!(parsed[0]["id"], "pi_1");
        assert_eq!(parsed[0]["amount"], 1234);
    }
}
