use mongodb::bson::doc;
use mongodb::{Client, Database};
use tracing::{info, warn};

use crate::errors::Result;

/// Connects and pings. Failure here is not fatal: the caller falls back to
/// the file store.
pub async fn connect(uri: &str, db_name: &str) -> Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    let db = client.database(db_name);

    match db.run_command(doc! {"ping": 1}).await {
        Ok(_) => info!(db_name, "connected to MongoDB"),
        Err(e) => {
            warn!(db_name, "MongoDB ping failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(db)
}
