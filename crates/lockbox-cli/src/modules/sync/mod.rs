mod actions;
pub(crate) mod args;

pub(crate) use actions::{
    handle_changes, handle_clear, handle_setup, handle_status, handle_sync, handle_vaults,
};
