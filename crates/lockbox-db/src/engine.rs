//! Seam to the underlying key-value store. The engine provides atomic
//! transactions over a set of stores; scoping and change tracking live above it.

use async_trait::async_trait;
use serde_json::Value;

use lockbox_core::{Error, Key, Mode, Result, StoreName};

#[async_trait]
pub trait Engine: Send + Sync {
    async fn begin(
        &self,
        stores: &[StoreName],
        mode: Mode,
    ) -> Result<Box<dyn EngineTransaction>>;
}

/// One open engine transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait EngineTransaction: Send {
    async fn get(&mut self, store: StoreName, key: &Key) -> Result<Option<Value>>;

    async fn put(&mut self, store: StoreName, key: &Key, value: &Value) -> Result<()>;

    async fn delete(&mut self, store: StoreName, key: &Key) -> Result<()>;

    async fn clear(&mut self, store: StoreName) -> Result<()>;

    /// Every record of `store` in key order.
    async fn scan(&mut self, store: StoreName) -> Result<Vec<(Key, Value)>>;

    /// Draws the next auto-increment key for `store`. Fails once a key of
    /// `i64::MAX` has been issued or written.
    async fn next_id(&mut self, store: StoreName) -> Result<i64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub(crate) fn generator_exhausted(store: StoreName) -> Error {
    Error::InvalidKey {
        store,
        message: "key generator exhausted".to_string(),
    }
}
