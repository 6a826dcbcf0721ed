//! Transaction scoping over the engine.
//!
//! A [`TransactionManager`] tracks at most one active [`Transaction`]. Callers
//! receive the handle from `begin` and pass it to every store access; nothing
//! reaches the engine without one.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use lockbox_core::{join_stores, Error, Key, Mode, Result, StoreName, Strategy};

use crate::engine::{Engine, EngineTransaction};

type ActiveSlot = Arc<Mutex<Option<(u64, Weak<TxShared>)>>>;

const FINISHED: &str = "transaction already finished";
const OUT_OF_SCOPE: &str = "store is outside the transaction scope";
const READ_ONLY: &str = "transaction is read-only";

fn lock_slot(slot: &ActiveSlot) -> MutexGuard<'_, Option<(u64, Weak<TxShared>)>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

struct TxShared {
    id: u64,
    stores: BTreeSet<StoreName>,
    mode: Mode,
    finished: AtomicBool,
    engine_tx: AsyncMutex<Option<Box<dyn EngineTransaction>>>,
    slot: ActiveSlot,
}

impl TxShared {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Release);
        let mut slot = lock_slot(&self.slot);
        if matches!(slot.as_ref(), Some((id, _)) if *id == self.id) {
            *slot = None;
        }
    }
}

pub struct TransactionManager {
    engine: Arc<dyn Engine>,
    active: ActiveSlot,
    next_id: AtomicU64,
}

impl TransactionManager {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Opens a transaction over `stores`.
    ///
    /// With [`Strategy::Reuse`] and an active transaction, the active one is
    /// joined when it covers every requested store and, for `ReadWrite`, is
    /// itself read-write; otherwise the call fails with `ScopeConflict`.
    /// Joined handles are nested: their `commit` is a no-op.
    pub async fn begin(
        &self,
        stores: &[StoreName],
        mode: Mode,
        strategy: Strategy,
    ) -> Result<Transaction> {
        let requested: BTreeSet<StoreName> = stores.iter().copied().collect();

        if strategy == Strategy::Reuse {
            if let Some(active) = self.active_shared() {
                let covers = requested.is_subset(&active.stores);
                let escalates = mode.allows_write() && !active.mode.allows_write();
                if !covers || escalates {
                    return Err(Error::ScopeConflict {
                        requested: join_stores(&requested),
                        mode,
                        active: join_stores(&active.stores),
                        active_mode: active.mode,
                    });
                }
                debug!(
                    tx_id = active.id,
                    stores = %join_stores(&requested),
                    "joining active transaction"
                );
                return Ok(Transaction {
                    shared: active,
                    owner: false,
                });
            }
        }

        let scope: Vec<StoreName> = requested.iter().copied().collect();
        let engine_tx = self.engine.begin(&scope, mode).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let shared = Arc::new(TxShared {
            id,
            stores: requested,
            mode,
            finished: AtomicBool::new(false),
            engine_tx: AsyncMutex::new(Some(engine_tx)),
            slot: Arc::clone(&self.active),
        });
        *lock_slot(&self.active) = Some((id, Arc::downgrade(&shared)));
        debug!(
            tx_id = id,
            stores = %join_stores(&scope),
            mode = %mode,
            "transaction opened"
        );
        Ok(Transaction {
            shared,
            owner: true,
        })
    }

    pub fn has_active(&self) -> bool {
        self.active_shared().is_some()
    }

    fn active_shared(&self) -> Option<Arc<TxShared>> {
        lock_slot(&self.active)
            .as_ref()
            .and_then(|(_, weak)| weak.upgrade())
            .filter(|shared| !shared.is_finished())
    }
}

/// Handle to an open transaction.
///
/// Dropping the owning handle without `commit` aborts the transaction.
pub struct Transaction {
    shared: Arc<TxShared>,
    owner: bool,
}

impl Transaction {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn mode(&self) -> Mode {
        self.shared.mode
    }

    pub fn stores(&self) -> impl Iterator<Item = StoreName> + '_ {
        self.shared.stores.iter().copied()
    }

    pub fn is_nested(&self) -> bool {
        !self.owner
    }

    pub fn is_active(&self) -> bool {
        !self.shared.is_finished()
    }

    pub fn is_same(&self, other: &Transaction) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn check(&self, store: StoreName, write: bool) -> Result<()> {
        let reason = if self.shared.is_finished() {
            FINISHED
        } else if !self.shared.stores.contains(&store) {
            OUT_OF_SCOPE
        } else if write && !self.shared.mode.allows_write() {
            READ_ONLY
        } else {
            return Ok(());
        };
        Err(Error::StoreUnavailable { store, reason })
    }

    pub async fn get(&self, store: StoreName, key: &Key) -> Result<Option<Value>> {
        self.check(store, false)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.get(store, key).await
    }

    pub async fn scan(&self, store: StoreName) -> Result<Vec<(Key, Value)>> {
        self.check(store, false)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.scan(store).await
    }

    pub async fn put(&self, store: StoreName, key: &Key, value: &Value) -> Result<()> {
        self.check(store, true)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.put(store, key, value).await
    }

    pub async fn delete(&self, store: StoreName, key: &Key) -> Result<()> {
        self.check(store, true)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.delete(store, key).await
    }

    pub async fn clear(&self, store: StoreName) -> Result<()> {
        self.check(store, true)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.clear(store).await
    }

    pub async fn next_id(&self, store: StoreName) -> Result<i64> {
        self.check(store, true)?;
        let mut guard = self.shared.engine_tx.lock().await;
        let tx = guard.as_mut().ok_or(Error::StoreUnavailable {
            store,
            reason: FINISHED,
        })?;
        tx.next_id(store).await
    }

    /// Commits the transaction. A nested handle leaves that to the owner.
    pub async fn commit(self) -> Result<()> {
        if !self.owner {
            return Ok(());
        }
        let engine_tx = self.shared.engine_tx.lock().await.take();
        self.shared.finish();
        let Some(engine_tx) = engine_tx else {
            return Err(Error::TransactionFinished);
        };
        engine_tx.commit().await?;
        debug!(tx_id = self.shared.id, "transaction committed");
        Ok(())
    }

    /// Aborts the whole transaction, including when called on a nested handle.
    pub async fn rollback(self) -> Result<()> {
        let engine_tx = self.shared.engine_tx.lock().await.take();
        self.shared.finish();
        if let Some(engine_tx) = engine_tx {
            engine_tx.rollback().await?;
            debug!(tx_id = self.shared.id, "transaction rolled back");
        }
        Ok(())
    }

    /// Commits on `Ok`, rolls back on `Err` and hands the result through.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let tx_id = self.id();
                if let Err(rollback_err) = self.rollback().await {
                    warn!(tx_id, error = %rollback_err, "rollback failed");
                }
                warn!(tx_id, error = %err, "transaction failed");
                Err(err)
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.owner || self.shared.is_finished() {
            return;
        }
        if let Ok(mut guard) = self.shared.engine_tx.try_lock() {
            guard.take();
        }
        self.shared.finish();
        debug!(tx_id = self.shared.id, "transaction dropped without commit");
    }
}
