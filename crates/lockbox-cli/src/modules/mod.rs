pub(crate) mod groups;
pub(crate) mod secrets;
pub(crate) mod sync;
pub(crate) mod system;
