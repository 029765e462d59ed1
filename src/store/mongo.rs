// store/mongo.rs
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::{error, info};

use crate::errors::Result;
use crate::models::transaction::ConfirmedTransaction;
use crate::store::TransactionStore;

const COLLECTION: &str = "transactions";

/// MongoDB-backed store. A unique index on the intent id is the mechanism
/// that serializes concurrent same-id appends: the first insert wins and
/// later ones surface as duplicate-key errors, which map to the idempotent
/// no-op.
pub struct MongoStore {
    collection: Collection<ConfirmedTransaction>,
}

impl MongoStore {
    pub async fn new(db: Database) -> Result<Self> {
        let collection = db.collection::<ConfirmedTransaction>(COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! {"id": 1})
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index).await?;

        Ok(MongoStore { collection })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

#[async_trait]
impl TransactionStore for MongoStore {
    async fn append(&self, tx: ConfirmedTransaction) -> Result<()> {
        let id = tx.id.clone();
        match self.collection.insert_one(&tx).await {
            Ok(_) => {
                info!(%id, amount = tx.amount, "transaction recorded");
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                info!(%id, "transaction already recorded, skipping duplicate delivery");
                Ok(())
            }
            Err(e) => {
                error!(operation = "append", %id, "mongodb write failed: {}", e);
                Err(e.into())
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<ConfirmedTransaction>> {
        // RFC 3339 timestamps sort correctly as strings, so the server can
        // order the scan.
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! {"timestamp": 1})
            .await?;
        let transactions: Vec<ConfirmedTransaction> = cursor.try_collect().await?;
        Ok(transactions)
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
