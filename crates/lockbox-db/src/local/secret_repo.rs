use lockbox_core::{Key, Result, Secret, StoreName};

use crate::local::LocalStore;
use crate::Transaction;

pub struct SecretRepo<'a> {
    store: LocalStore<'a>,
}

impl<'a> SecretRepo<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        Self {
            store: LocalStore::new(tx, StoreName::Secrets),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Secret>> {
        self.store.get_as(&Key::Int(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Secret>> {
        self.store.get_all_as().await
    }

    /// Upserts the secret and returns it with its assigned id.
    pub async fn put(&self, secret: &Secret) -> Result<Secret> {
        let key = self.store.put_as(secret, None).await?;
        let mut saved = secret.clone();
        saved.id = key.as_int();
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(&Key::Int(id)).await
    }
}
