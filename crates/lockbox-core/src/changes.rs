//! The `changes` document: local mutations that the remote vault has not
//! acknowledged yet. Remote snapshot deltas share the same shape.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChangeOp, Key, StoreName};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreChanges {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insert: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<Value>,
    /// Bare ids or full records carrying their id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<Value>,
}

impl StoreChanges {
    pub fn entries(&self, op: ChangeOp) -> &[Value] {
        match op {
            ChangeOp::Insert => &self.insert,
            ChangeOp::Update => &self.update,
            ChangeOp::Delete => &self.delete,
        }
    }

    fn entries_mut(&mut self, op: ChangeOp) -> &mut Vec<Value> {
        match op {
            ChangeOp::Insert => &mut self.insert,
            ChangeOp::Update => &mut self.update,
            ChangeOp::Delete => &mut self.delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insert.len() + self.update.len() + self.delete.len()
    }
}

/// Per-store pending operations, appended in mutation order and never
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeLog {
    stores: BTreeMap<StoreName, StoreChanges>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, store: StoreName, op: ChangeOp, payload: Value) {
        self.stores
            .entry(store)
            .or_default()
            .entries_mut(op)
            .push(payload);
    }

    pub fn is_dirty(&self) -> bool {
        self.stores.values().any(|changes| !changes.is_empty())
    }

    pub fn clear(&mut self) {
        self.stores.clear();
    }

    pub fn get(&self, store: StoreName) -> Option<&StoreChanges> {
        self.stores.get(&store)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StoreName, &StoreChanges)> {
        self.stores.iter().map(|(store, changes)| (*store, changes))
    }

    /// Number of pending entries across all stores and operations.
    pub fn len(&self) -> usize {
        self.stores.values().map(StoreChanges::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_dirty()
    }

    /// Keys of every record the log touches in `store`.
    pub fn touched_keys(&self, store: StoreName) -> BTreeSet<Key> {
        let Some(changes) = self.stores.get(&store) else {
            return BTreeSet::new();
        };
        ChangeOp::APPLY_ORDER
            .iter()
            .flat_map(|op| changes.entries(*op))
            .filter_map(|entry| entry_key(store, entry))
            .collect()
    }
}

/// Resolves the key an entry refers to: the key-path field of a record, or
/// the entry itself when it is a bare id.
pub fn entry_key(store: StoreName, entry: &Value) -> Option<Key> {
    match entry {
        Value::Object(fields) => store
            .key_path()
            .and_then(|path| fields.get(path))
            .and_then(Key::from_value),
        other => Key::from_value(other),
    }
}
