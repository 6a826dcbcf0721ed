#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lockbox_core::{ChangeLog, Error, FetchResponse, RemoteId, Result, Snapshot, Vault};
use lockbox_db::{MemoryEngine, TransactionManager};
use lockbox_sync::{Remote, SyncEngine};
use serde_json::Value;

#[derive(Default)]
struct FakeState {
    vaults: Vec<Vault>,
    fetches: VecDeque<std::result::Result<Vec<Snapshot>, u16>>,
    pushes: VecDeque<std::result::Result<Snapshot, u16>>,
    fetch_calls: Vec<(RemoteId, Option<RemoteId>)>,
    pushed: Vec<ChangeLog>,
}

/// Scripted vault server. Unscripted fetches return no snapshots; unscripted
/// pushes fail.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRemote {
    pub fn queue_fetch(&self, snapshots: Vec<Snapshot>) {
        self.state.lock().expect("lock").fetches.push_back(Ok(snapshots));
    }

    pub fn queue_fetch_failure(&self, status: u16) {
        self.state.lock().expect("lock").fetches.push_back(Err(status));
    }

    pub fn queue_push(&self, snapshot: Snapshot) {
        self.state.lock().expect("lock").pushes.push_back(Ok(snapshot));
    }

    pub fn queue_push_failure(&self, status: u16) {
        self.state.lock().expect("lock").pushes.push_back(Err(status));
    }

    pub fn set_vaults(&self, vaults: Vec<Vault>) {
        self.state.lock().expect("lock").vaults = vaults;
    }

    pub fn fetch_calls(&self) -> Vec<(RemoteId, Option<RemoteId>)> {
        self.state.lock().expect("lock").fetch_calls.clone()
    }

    pub fn pushed(&self) -> Vec<ChangeLog> {
        self.state.lock().expect("lock").pushed.clone()
    }
}

fn remote_error(status: u16) -> Error {
    Error::Remote {
        status,
        body: "scripted failure".to_string(),
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn list_vaults(&self) -> Result<Vec<Vault>> {
        Ok(self.state.lock().expect("lock").vaults.clone())
    }

    async fn fetch_changes(
        &self,
        vault_id: &RemoteId,
        since: Option<&RemoteId>,
    ) -> Result<FetchResponse> {
        let mut state = self.state.lock().expect("lock");
        state
            .fetch_calls
            .push((vault_id.clone(), since.cloned()));
        match state.fetches.pop_front() {
            Some(Ok(snapshots)) => Ok(FetchResponse {
                vault: Vault::new(vault_id.clone()),
                snapshots,
            }),
            Some(Err(status)) => Err(remote_error(status)),
            None => Ok(FetchResponse {
                vault: Vault::new(vault_id.clone()),
                snapshots: Vec::new(),
            }),
        }
    }

    async fn push_changes(&self, _vault_id: &RemoteId, changes: &ChangeLog) -> Result<Snapshot> {
        let mut state = self.state.lock().expect("lock");
        state.pushed.push(changes.clone());
        match state.pushes.pop_front() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(status)) => Err(remote_error(status)),
            None => Err(Error::Network("no push scripted".to_string())),
        }
    }
}

pub fn snapshot(id: i64, delta: Value) -> Snapshot {
    Snapshot {
        id: RemoteId::Int(id),
        delta: Value::String(delta.to_string()),
    }
}

pub struct Harness {
    pub engine: MemoryEngine,
    pub manager: Arc<TransactionManager>,
    pub remote: FakeRemote,
    pub sync: SyncEngine<FakeRemote>,
}

pub fn harness() -> Harness {
    let engine = MemoryEngine::new();
    let manager = Arc::new(TransactionManager::new(Arc::new(engine.clone())));
    let remote = FakeRemote::default();
    let sync = SyncEngine::new(Arc::clone(&manager), remote.clone());
    Harness {
        engine,
        manager,
        remote,
        sync,
    }
}
