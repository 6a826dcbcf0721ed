//! Local operations used by callers outside the sync engine. Every mutation
//! records its change-log entry in the same transaction as the data write.

use serde_json::Value;
use tracing::{debug, info};

use lockbox_core::{
    ChangeLog, ChangeOp, Error, Group, Key, Mode, Result, Secret, SecretQuery, StoreName,
    Strategy, SyncStatus,
};

use crate::local::{GroupRepo, LocalStore, MetadataRepo, SecretRepo};
use crate::{Transaction, TransactionManager};

const SECRET_WRITE_SCOPE: [StoreName; 2] = [StoreName::Meta, StoreName::Secrets];

pub struct LocalServices<'a> {
    manager: &'a TransactionManager,
}

impl<'a> LocalServices<'a> {
    pub fn new(manager: &'a TransactionManager) -> Self {
        Self { manager }
    }

    pub async fn find_groups(&self) -> Result<Vec<Group>> {
        let tx = self.read(StoreName::Groups).await?;
        let result = GroupRepo::new(&tx).list().await;
        tx.finish(result).await
    }

    pub async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let tx = self.read(StoreName::Groups).await?;
        let result = GroupRepo::new(&tx).get(id).await;
        tx.finish(result).await
    }

    pub async fn find_secrets(&self, query: &SecretQuery) -> Result<Vec<Secret>> {
        let tx = self.read(StoreName::Secrets).await?;
        let result = SecretRepo::new(&tx).list().await.map(|secrets| {
            secrets
                .into_iter()
                .filter(|secret| query.matches(secret))
                .collect()
        });
        tx.finish(result).await
    }

    pub async fn get_secret(&self, id: i64) -> Result<Option<Secret>> {
        let tx = self.read(StoreName::Secrets).await?;
        let result = SecretRepo::new(&tx).get(id).await;
        tx.finish(result).await
    }

    /// Inserts a secret without id or updates an existing one.
    ///
    /// Joins an active read-write transaction covering `meta` and `secrets`.
    pub async fn save_secret(&self, secret: Secret) -> Result<Secret> {
        let tx = self
            .manager
            .begin(&SECRET_WRITE_SCOPE, Mode::ReadWrite, Strategy::Reuse)
            .await?;
        let result = save_secret_in(&tx, secret).await;
        tx.finish(result).await
    }

    pub async fn remove_secret(&self, id: i64) -> Result<()> {
        let tx = self
            .manager
            .begin(&SECRET_WRITE_SCOPE, Mode::ReadWrite, Strategy::Reuse)
            .await?;
        let result = remove_secret_in(&tx, id).await;
        tx.finish(result).await
    }

    pub async fn get_sync_status(&self) -> Result<Option<SyncStatus>> {
        let tx = self.read(StoreName::Meta).await?;
        let result = MetadataRepo::new(&tx).sync_status().await;
        tx.finish(result).await
    }

    pub async fn get_unsynced_changes(&self) -> Result<ChangeLog> {
        let tx = self.read(StoreName::Meta).await?;
        let result = MetadataRepo::new(&tx)
            .changes()
            .await
            .map(Option::unwrap_or_default);
        tx.finish(result).await
    }

    pub async fn is_dirty(&self) -> Result<bool> {
        Ok(self.get_unsynced_changes().await?.is_dirty())
    }

    /// Empties every store, pending changes and sync status included.
    pub async fn clear(&self) -> Result<()> {
        let tx = self
            .manager
            .begin(&StoreName::ALL, Mode::ReadWrite, Strategy::New)
            .await?;
        let result = clear_stores(&tx).await;
        tx.finish(result).await?;
        info!("local stores cleared");
        Ok(())
    }

    async fn read(&self, store: StoreName) -> Result<Transaction> {
        self.manager.begin(&[store], Mode::Read, Strategy::New).await
    }
}

pub async fn clear_stores(tx: &Transaction) -> Result<()> {
    for store in StoreName::ALL {
        LocalStore::new(tx, store).clear().await?;
    }
    Ok(())
}

async fn record_change(tx: &Transaction, op: ChangeOp, payload: Value) -> Result<()> {
    let meta = MetadataRepo::new(tx);
    let mut changes = meta.changes().await?.unwrap_or_default();
    changes.record(StoreName::Secrets, op, payload);
    meta.set_changes(&changes).await
}

async fn save_secret_in(tx: &Transaction, secret: Secret) -> Result<Secret> {
    let repo = SecretRepo::new(tx);
    let op = match secret.id {
        None => ChangeOp::Insert,
        Some(id) => {
            if repo.get(id).await?.is_none() {
                return Err(Error::NotFound {
                    store: StoreName::Secrets,
                    key: Key::Int(id),
                });
            }
            ChangeOp::Update
        }
    };
    let saved = repo.put(&secret).await?;
    record_change(tx, op, serde_json::to_value(&saved)?).await?;
    debug!(secret_id = ?saved.id, op = %op, "secret saved");
    Ok(saved)
}

async fn remove_secret_in(tx: &Transaction, id: i64) -> Result<()> {
    let repo = SecretRepo::new(tx);
    if repo.get(id).await?.is_none() {
        return Err(Error::NotFound {
            store: StoreName::Secrets,
            key: Key::Int(id),
        });
    }
    repo.delete(id).await?;
    record_change(tx, ChangeOp::Delete, Value::from(id)).await?;
    debug!(secret_id = id, "secret removed");
    Ok(())
}
