//! File-backed storage for the hourbook work log.
//!
//! Each persisted slice lives in its own file under the data directory, so a
//! corrupt slice never takes the others down with it.

mod config;
mod store;

use std::sync::Arc;

use anyhow::Result;
use hourbook_core::WorkLog;

pub use config::StoreConfig;
pub use store::FsStore;

/// Open the work log stored in the directory named by `config`.
pub async fn open_work_log(config: &StoreConfig) -> Result<WorkLog<FsStore>> {
    let store = FsStore::from_config(config)?;
    tracing::info!(dir = %store.dir().display(), "opening work log");
    Ok(WorkLog::open(Arc::new(store)).await)
}
