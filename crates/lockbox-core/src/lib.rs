#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod changes;
pub mod error;
pub mod models;

pub use crate::changes::*;
pub use crate::error::*;
pub use crate::models::*;
