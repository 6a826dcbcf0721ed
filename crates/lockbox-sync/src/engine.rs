//! Fetch, apply, push.
//!
//! `sync` reads the sync status, fetches every snapshot after the stored
//! cursor, applies them oldest first and, when the change log is dirty, pushes
//! it. Apply and push share one read-write transaction over all stores, so a
//! failure anywhere after the fetch leaves the local state as it was.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use lockbox_core::{
    ChangeLog, Error, FetchResponse, Mode, RemoteId, Result, StoreName, Strategy, SyncStatus,
    Vault,
};
use lockbox_db::local::MetadataRepo;
use lockbox_db::services::clear_stores;
use lockbox_db::{Transaction, TransactionManager};

use crate::apply::{apply_delta, ensure_no_conflicts, parse_snapshots};
use crate::remote::Remote;

pub struct SyncEngine<R> {
    manager: Arc<TransactionManager>,
    remote: R,
}

impl<R: Remote> SyncEngine<R> {
    pub fn new(manager: Arc<TransactionManager>, remote: R) -> Self {
        Self { manager, remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub async fn list_vaults(&self) -> Result<Vec<Vault>> {
        self.remote.list_vaults().await
    }

    pub async fn status(&self) -> Result<Option<SyncStatus>> {
        let tx = self
            .manager
            .begin(&[StoreName::Meta], Mode::Read, Strategy::New)
            .await?;
        let result = MetadataRepo::new(&tx).sync_status().await;
        tx.finish(result).await
    }

    pub async fn sync(&self) -> Result<SyncStatus> {
        let status = self.status().await?.ok_or(Error::NoVaultConfigured)?;
        let fetched = self.fetch(&status).await?;

        let tx = self.write_all().await?;
        let result = self.apply_and_push(&tx, fetched).await;
        tx.finish(result).await
    }

    /// Wipes local data, binds the store to `vault_id` and runs a full sync.
    pub async fn setup(&self, vault_id: RemoteId) -> Result<SyncStatus> {
        let tx = self.write_all().await?;
        let result = self.setup_in(&tx, vault_id).await;
        tx.finish(result).await
    }

    async fn setup_in(&self, tx: &Transaction, vault_id: RemoteId) -> Result<SyncStatus> {
        clear_stores(tx).await?;
        let status = SyncStatus::new(vault_id);
        let meta = MetadataRepo::new(tx);
        meta.set_sync_status(&status).await?;
        meta.set_changes(&ChangeLog::new()).await?;
        info!(vault_id = %status.vault.id, "vault bound to local store");

        let fetched = self.fetch(&status).await?;
        self.apply_and_push(tx, fetched).await
    }

    async fn write_all(&self) -> Result<Transaction> {
        self.manager
            .begin(&StoreName::ALL, Mode::ReadWrite, Strategy::New)
            .await
    }

    async fn fetch(&self, status: &SyncStatus) -> Result<FetchResponse> {
        let since = status.cursor();
        debug!(
            vault_id = %status.vault.id,
            since = ?since.map(ToString::to_string),
            "fetching remote changes"
        );
        let fetched = self.remote.fetch_changes(&status.vault.id, since).await?;
        info!(
            vault_id = %fetched.vault.id,
            snapshots = fetched.snapshots.len(),
            "fetched remote changes"
        );
        Ok(fetched)
    }

    async fn apply_and_push(&self, tx: &Transaction, fetched: FetchResponse) -> Result<SyncStatus> {
        let meta = MetadataRepo::new(tx);
        let mut status = meta.sync_status().await?.ok_or(Error::NoVaultConfigured)?;
        let mut changes = match meta.changes().await? {
            Some(changes) => changes,
            None => {
                let changes = ChangeLog::new();
                meta.set_changes(&changes).await?;
                changes
            }
        };

        let FetchResponse { vault, snapshots } = fetched;
        let deltas = parse_snapshots(status.cursor(), &snapshots)?;
        ensure_no_conflicts(&changes, &deltas)?;
        for (snapshot, delta) in snapshots.iter().zip(&deltas) {
            debug!(snapshot_id = %snapshot.id, entries = delta.len(), "applying snapshot");
            apply_delta(tx, delta).await?;
        }

        status.vault = vault;
        if let Some(last) = snapshots.into_iter().last() {
            status.snapshot = Some(last);
        }
        status.when = Some(Utc::now());
        meta.set_sync_status(&status).await?;

        if !changes.is_dirty() {
            debug!("no local changes to push");
            return Ok(status);
        }

        info!(
            vault_id = %status.vault.id,
            pending = changes.len(),
            "pushing local changes"
        );
        let snapshot = self.remote.push_changes(&status.vault.id, &changes).await?;
        if let Some(current) = status.cursor() {
            if !snapshot.id.follows(current) {
                return Err(Error::SnapshotRegression {
                    current: current.clone(),
                    incoming: snapshot.id,
                });
            }
        }
        info!(snapshot_id = %snapshot.id, "local changes acknowledged");

        changes.clear();
        status.snapshot = Some(snapshot);
        status.when = Some(Utc::now());
        meta.set_changes(&changes).await?;
        meta.set_sync_status(&status).await?;
        Ok(status)
    }
}
