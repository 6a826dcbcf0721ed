use std::collections::BTreeSet;

use tracing::warn;

use lockbox_core::{
    entry_key, ChangeLog, ChangeOp, ConflictEntry, Error, RemoteId, Result, Snapshot, StoreName,
};
use lockbox_db::local::LocalStore;
use lockbox_db::Transaction;

/// Stores a remote delta may write to.
const RECORD_STORES: [StoreName; 2] = [StoreName::Secrets, StoreName::Groups];

/// Parses every snapshot's delta, rejecting a chain that does not move
/// forward from `cursor`.
pub(crate) fn parse_snapshots(
    cursor: Option<&RemoteId>,
    snapshots: &[Snapshot],
) -> Result<Vec<ChangeLog>> {
    let mut previous = cursor.cloned();
    let mut deltas = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        if let Some(current) = previous {
            if !snapshot.id.follows(&current) {
                return Err(Error::SnapshotRegression {
                    current,
                    incoming: snapshot.id.clone(),
                });
            }
        }
        deltas.push(snapshot.changes()?);
        previous = Some(snapshot.id.clone());
    }
    Ok(deltas)
}

/// Ids with a pending local change that an incoming delta also touches.
pub(crate) fn find_conflicts(pending: &ChangeLog, deltas: &[ChangeLog]) -> Vec<ConflictEntry> {
    let mut conflicts = BTreeSet::new();
    for store in RECORD_STORES {
        let local = pending.touched_keys(store);
        if local.is_empty() {
            continue;
        }
        for delta in deltas {
            for key in delta.touched_keys(store).intersection(&local) {
                conflicts.insert((store, key.clone()));
            }
        }
    }
    conflicts
        .into_iter()
        .map(|(store, key)| ConflictEntry { store, key })
        .collect()
}

pub(crate) fn ensure_no_conflicts(pending: &ChangeLog, deltas: &[ChangeLog]) -> Result<()> {
    let conflicts = find_conflicts(pending, deltas);
    if conflicts.is_empty() {
        return Ok(());
    }
    warn!(count = conflicts.len(), "remote changes overlap pending local changes");
    Err(Error::Conflict(conflicts))
}

/// Applies one delta: per store, inserts, then deletes, then updates.
pub(crate) async fn apply_delta(tx: &Transaction, delta: &ChangeLog) -> Result<()> {
    for (store, changes) in delta.iter() {
        if !RECORD_STORES.contains(&store) {
            return Err(Error::InvalidKey {
                store,
                message: "remote deltas may only modify record stores".to_string(),
            });
        }
        let local = LocalStore::new(tx, store);
        for op in ChangeOp::APPLY_ORDER {
            for entry in changes.entries(op) {
                match op {
                    ChangeOp::Insert | ChangeOp::Update => {
                        local.put(entry.clone(), None).await?;
                    }
                    ChangeOp::Delete => {
                        let key = entry_key(store, entry).ok_or_else(|| Error::InvalidKey {
                            store,
                            message: format!("delete entry without id: {entry}"),
                        })?;
                        local.delete(&key).await?;
                    }
                }
            }
        }
    }
    Ok(())
}
