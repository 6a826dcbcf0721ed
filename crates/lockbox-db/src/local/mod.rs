mod group_repo;
mod metadata_repo;
mod secret_repo;
mod store;

pub use group_repo::GroupRepo;
pub use metadata_repo::{MetadataRepo, CHANGES_KEY, SYNC_KEY};
pub use secret_repo::SecretRepo;
pub use store::LocalStore;
