#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod engine;
pub mod local;
pub mod memory;
pub mod services;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod transaction;

pub use engine::{Engine, EngineTransaction};
pub use memory::MemoryEngine;
#[cfg(feature = "sqlite")]
pub use sqlite::{connect_sqlite, connect_sqlite_with_max, SqliteEngine, SqlitePool};
pub use transaction::{Transaction, TransactionManager};
