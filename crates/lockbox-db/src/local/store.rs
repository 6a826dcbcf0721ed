use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use lockbox_core::{Error, Key, Result, StoreName};

use crate::Transaction;

/// CRUD and full-scan access to one named store inside a transaction.
pub struct LocalStore<'a> {
    tx: &'a Transaction,
    store: StoreName,
}

impl<'a> LocalStore<'a> {
    pub fn new(tx: &'a Transaction, store: StoreName) -> Self {
        Self { tx, store }
    }

    pub fn name(&self) -> StoreName {
        self.store
    }

    pub async fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.tx.get(self.store, key).await
    }

    pub async fn get_all(&self) -> Result<BTreeMap<Key, Value>> {
        Ok(self.tx.scan(self.store).await?.into_iter().collect())
    }

    /// Writes `value` and returns its key.
    ///
    /// Stores with a key path take the key from the record and draw one from
    /// the generator when it is missing; other stores need an explicit `key`.
    pub async fn put(&self, value: Value, key: Option<Key>) -> Result<Key> {
        let (key, value) = match self.store.key_path() {
            Some(path) => self.inline_key(path, value, key).await?,
            None => {
                let key = key.ok_or_else(|| Error::InvalidKey {
                    store: self.store,
                    message: "explicit key required".to_string(),
                })?;
                (key, value)
            }
        };
        self.tx.put(self.store, &key, &value).await?;
        Ok(key)
    }

    async fn inline_key(
        &self,
        path: &str,
        mut value: Value,
        key: Option<Key>,
    ) -> Result<(Key, Value)> {
        if key.is_some() {
            return Err(Error::InvalidKey {
                store: self.store,
                message: format!("records carry their key in `{path}`"),
            });
        }
        let Value::Object(fields) = &mut value else {
            return Err(Error::InvalidKey {
                store: self.store,
                message: "record must be an object".to_string(),
            });
        };
        let key = match fields.get(path) {
            None | Some(Value::Null) => {
                let id = self.tx.next_id(self.store).await?;
                fields.insert(path.to_string(), Value::from(id));
                Key::Int(id)
            }
            Some(existing) => Key::from_value(existing).ok_or_else(|| Error::InvalidKey {
                store: self.store,
                message: format!("`{path}` must be an integer or string"),
            })?,
        };
        Ok((key, value))
    }

    pub async fn delete(&self, key: &Key) -> Result<()> {
        self.tx.delete(self.store, key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.tx.clear(self.store).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, key: &Key) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get_all_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.tx
            .scan(self.store)
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(Error::from))
            .collect()
    }

    pub async fn put_as<T: Serialize>(&self, record: &T, key: Option<Key>) -> Result<Key> {
        self.put(serde_json::to_value(record)?, key).await
    }
}
