use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use lockbox_core::{Error, Key, Mode, Result, StoreName};

use crate::engine::{generator_exhausted, Engine, EngineTransaction};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    records: BTreeMap<Key, Value>,
    next_id: i64,
    /// Set once a key reached `i64::MAX`; the generator never issues again.
    exhausted: bool,
}

impl MemoryTable {
    fn bump(&mut self, key: &Key) {
        if let Some(id) = key.as_int() {
            if id >= self.next_id {
                self.advance_past(id);
            }
        }
    }

    fn advance_past(&mut self, id: i64) {
        match id.checked_add(1) {
            Some(next) => self.next_id = next,
            None => self.exhausted = true,
        }
    }
}

type Tables = BTreeMap<StoreName, MemoryTable>;

/// Process-local engine. Each transaction works on a copy of its scoped
/// stores and writes them back on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records in `store`.
    pub fn len(&self, store: StoreName) -> Result<usize> {
        Ok(lock(&self.tables)?
            .get(&store)
            .map(|table| table.records.len())
            .unwrap_or(0))
    }
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
    tables
        .lock()
        .map_err(|_| Error::Storage("memory engine lock poisoned".to_string()))
}

#[async_trait]
impl Engine for MemoryEngine {
    async fn begin(
        &self,
        stores: &[StoreName],
        mode: Mode,
    ) -> Result<Box<dyn EngineTransaction>> {
        let working = {
            let tables = lock(&self.tables)?;
            stores
                .iter()
                .map(|store| (*store, tables.get(store).cloned().unwrap_or_default()))
                .collect()
        };
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            working,
            mode,
        }))
    }
}

struct MemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    working: Tables,
    mode: Mode,
}

impl MemoryTransaction {
    fn table(&mut self, store: StoreName) -> Result<&mut MemoryTable> {
        self.working
            .get_mut(&store)
            .ok_or_else(|| Error::Storage(format!("store {store} is not part of the transaction")))
    }
}

#[async_trait]
impl EngineTransaction for MemoryTransaction {
    async fn get(&mut self, store: StoreName, key: &Key) -> Result<Option<Value>> {
        Ok(self.table(store)?.records.get(key).cloned())
    }

    async fn put(&mut self, store: StoreName, key: &Key, value: &Value) -> Result<()> {
        let table = self.table(store)?;
        table.bump(key);
        table.records.insert(key.clone(), value.clone());
        Ok(())
    }

    async fn delete(&mut self, store: StoreName, key: &Key) -> Result<()> {
        self.table(store)?.records.remove(key);
        Ok(())
    }

    async fn clear(&mut self, store: StoreName) -> Result<()> {
        self.table(store)?.records.clear();
        Ok(())
    }

    async fn scan(&mut self, store: StoreName) -> Result<Vec<(Key, Value)>> {
        Ok(self
            .table(store)?
            .records
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn next_id(&mut self, store: StoreName) -> Result<i64> {
        let table = self.table(store)?;
        if table.exhausted {
            return Err(generator_exhausted(store));
        }
        let id = table.next_id.max(1);
        table.advance_past(id);
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if !self.mode.allows_write() {
            return Ok(());
        }
        let MemoryTransaction {
            tables, working, ..
        } = *self;
        let mut committed = lock(&tables)?;
        for (store, table) in working {
            committed.insert(store, table);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
