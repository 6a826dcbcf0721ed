use lockbox_core::{ChangeLog, Key, Result, StoreName, SyncStatus};

use crate::local::LocalStore;
use crate::Transaction;

pub const SYNC_KEY: &str = "sync";
pub const CHANGES_KEY: &str = "changes";

/// The two documents of the `meta` store.
pub struct MetadataRepo<'a> {
    store: LocalStore<'a>,
}

impl<'a> MetadataRepo<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        Self {
            store: LocalStore::new(tx, StoreName::Meta),
        }
    }

    pub async fn sync_status(&self) -> Result<Option<SyncStatus>> {
        self.store.get_as(&Key::from(SYNC_KEY)).await
    }

    pub async fn set_sync_status(&self, status: &SyncStatus) -> Result<()> {
        self.store
            .put_as(status, Some(Key::from(SYNC_KEY)))
            .await
            .map(|_| ())
    }

    pub async fn changes(&self) -> Result<Option<ChangeLog>> {
        self.store.get_as(&Key::from(CHANGES_KEY)).await
    }

    pub async fn set_changes(&self, changes: &ChangeLog) -> Result<()> {
        self.store
            .put_as(changes, Some(Key::from(CHANGES_KEY)))
            .await
            .map(|_| ())
    }
}
