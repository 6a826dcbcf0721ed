mod enums;
mod key;
mod structs;

pub use enums::*;
pub use key::*;
pub use structs::*;
