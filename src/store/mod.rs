// store/mod.rs
pub mod file;
pub mod mongo;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::transaction::ConfirmedTransaction;

pub use file::FileStore;
pub use mongo::MongoStore;

/// Durable home of confirmed transactions. Both implementations satisfy
/// the same contract so the backing is a startup-time configuration
/// choice, never ambient state.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Records a transaction. Idempotent by `tx.id`: appending a record
    /// whose id already exists is a logged no-op, not an error and not a
    /// duplicate row. Concurrent same-id appends resolve to first writer
    /// wins.
    async fn append(&self, tx: ConfirmedTransaction) -> Result<()>;

    /// The current full set, ordered by record timestamp ascending.
    /// Restartable: each call re-reads, it is not a live stream.
    async fn list_all(&self) -> Result<Vec<ConfirmedTransaction>>;

    /// Backend name for health reporting.
    fn backend(&self) -> &'static str;
}
