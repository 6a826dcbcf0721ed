use thiserror::Error;

use crate::{Key, Mode, RemoteId, StoreName};

/// A record id that has a pending local change and is also touched by an
/// incoming remote delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    pub store: StoreName,
    pub key: Key,
}

impl std::fmt::Display for ConflictEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.store, self.key)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transaction scope conflict: requested {mode} over [{requested}] while [{active}] ({active_mode}) is active")]
    ScopeConflict {
        requested: String,
        mode: Mode,
        active: String,
        active_mode: Mode,
    },

    #[error("store {store} unavailable: {reason}")]
    StoreUnavailable {
        store: StoreName,
        reason: &'static str,
    },

    #[error("transaction already finished")]
    TransactionFinished,

    #[error("no vault configured; run setup first")]
    NoVaultConfigured,

    #[error("{store} record not found: {key}")]
    NotFound { store: StoreName, key: Key },

    #[error("invalid key for store {store}: {message}")]
    InvalidKey { store: StoreName, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("remote error: {status} {body}")]
    Remote { status: u16, body: String },

    #[error("unresolved sync conflict on {}", join_conflicts(.0))]
    Conflict(Vec<ConflictEntry>),

    #[error("snapshot {incoming} does not follow {current}")]
    SnapshotRegression { current: RemoteId, incoming: RemoteId },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_conflicts(entries: &[ConflictEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn join_stores<'a>(stores: impl IntoIterator<Item = &'a StoreName>) -> String {
    stores
        .into_iter()
        .map(|store| store.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
