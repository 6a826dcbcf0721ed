use lockbox_core::{Group, Key, Result, StoreName};

use crate::local::LocalStore;
use crate::Transaction;

pub struct GroupRepo<'a> {
    store: LocalStore<'a>,
}

impl<'a> GroupRepo<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        Self {
            store: LocalStore::new(tx, StoreName::Groups),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Group>> {
        self.store.get_as(&Key::Int(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Group>> {
        self.store.get_all_as().await
    }
}
