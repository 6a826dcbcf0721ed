#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

mod apply;
pub mod engine;
pub mod remote;

pub use engine::SyncEngine;
pub use remote::{HttpRemote, Remote};
