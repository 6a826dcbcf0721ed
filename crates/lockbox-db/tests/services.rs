use std::sync::Arc;

use lockbox_core::{ChangeOp, Error, Mode, Secret, SecretQuery, StoreName, Strategy};
use lockbox_db::local::LocalStore;
use lockbox_db::services::LocalServices;
use lockbox_db::{MemoryEngine, TransactionManager};
use serde_json::json;

fn manager() -> TransactionManager {
    TransactionManager::new(Arc::new(MemoryEngine::new()))
}

fn secret(group_id: i64, resource: &str) -> Secret {
    Secret {
        id: None,
        group_id,
        resource: resource.to_string(),
        principal: "user".to_string(),
        password: "hunter2".to_string(),
        note: String::new(),
    }
}

#[tokio::test]
async fn save_secret_records_insert_then_update() {
    let manager = manager();
    let services = LocalServices::new(&manager);

    let saved = services
        .save_secret(secret(1, "mail"))
        .await
        .expect("insert");
    let id = saved.id.expect("assigned id");

    let mut edited = saved.clone();
    edited.password = "changed".to_string();
    services.save_secret(edited).await.expect("update");

    let stored = services
        .get_secret(id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(stored.password, "changed");

    let changes = services.get_unsynced_changes().await.expect("changes");
    let secrets = changes.get(StoreName::Secrets).expect("secrets changes");
    assert_eq!(secrets.entries(ChangeOp::Insert).len(), 1);
    assert_eq!(secrets.entries(ChangeOp::Update).len(), 1);
    assert_eq!(secrets.entries(ChangeOp::Insert)[0]["id"], json!(id));
    assert_eq!(secrets.entries(ChangeOp::Update)[0]["password"], json!("changed"));
    assert!(services.is_dirty().await.expect("dirty"));
}

#[tokio::test]
async fn updating_unknown_secret_fails() {
    let manager = manager();
    let services = LocalServices::new(&manager);

    let mut ghost = secret(1, "ghost");
    ghost.id = Some(42);
    let err = services.save_secret(ghost).await.err().expect("not found");
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(!services.is_dirty().await.expect("dirty"));
}

#[tokio::test]
async fn remove_secret_records_delete_by_id() {
    let manager = manager();
    let services = LocalServices::new(&manager);
    let saved = services.save_secret(secret(1, "vpn")).await.expect("save");
    let id = saved.id.expect("id");

    services.remove_secret(id).await.expect("remove");

    assert!(services.get_secret(id).await.expect("get").is_none());
    let changes = services.get_unsynced_changes().await.expect("changes");
    let secrets = changes.get(StoreName::Secrets).expect("secrets changes");
    assert_eq!(secrets.entries(ChangeOp::Delete), &[json!(id)]);
}

#[tokio::test]
async fn removing_missing_secret_leaves_change_log_alone() {
    let manager = manager();
    let services = LocalServices::new(&manager);
    services.save_secret(secret(1, "a")).await.expect("save");
    let before = services.get_unsynced_changes().await.expect("changes");

    let err = services.remove_secret(99).await.err().expect("not found");
    assert!(matches!(err, Error::NotFound { .. }));

    let after = services.get_unsynced_changes().await.expect("changes");
    assert_eq!(before, after);
}

#[tokio::test]
async fn find_secrets_filters_by_query() {
    let manager = manager();
    let services = LocalServices::new(&manager);
    services.save_secret(secret(1, "GitHub")).await.expect("save");
    services.save_secret(secret(1, "GitLab")).await.expect("save");
    services.save_secret(secret(2, "Bank")).await.expect("save");

    let all = services
        .find_secrets(&SecretQuery::default())
        .await
        .expect("all");
    assert_eq!(all.len(), 3);

    let git = services
        .find_secrets(&SecretQuery {
            group: Some(1),
            keyword: Some("git".to_string()),
        })
        .await
        .expect("git");
    assert_eq!(git.len(), 2);

    let bank = services
        .find_secrets(&SecretQuery {
            group: Some(1),
            keyword: Some("bank".to_string()),
        })
        .await
        .expect("bank");
    assert!(bank.is_empty());
}

#[tokio::test]
async fn save_joins_caller_transaction() {
    let manager = manager();
    let services = LocalServices::new(&manager);

    let outer = manager
        .begin(&StoreName::ALL, Mode::ReadWrite, Strategy::New)
        .await
        .expect("outer");
    services.save_secret(secret(1, "a")).await.expect("save a");
    services.save_secret(secret(1, "b")).await.expect("save b");
    assert!(outer.is_active());
    outer.rollback().await.expect("rollback");

    assert!(services
        .find_secrets(&SecretQuery::default())
        .await
        .expect("find")
        .is_empty());
    assert!(!services.is_dirty().await.expect("dirty"));
}

#[tokio::test]
async fn save_under_read_scope_conflicts() {
    let manager = manager();
    let services = LocalServices::new(&manager);

    let _reader = manager
        .begin(&StoreName::ALL, Mode::Read, Strategy::New)
        .await
        .expect("reader");
    let err = services
        .save_secret(secret(1, "a"))
        .await
        .err()
        .expect("conflict");
    assert!(matches!(err, Error::ScopeConflict { .. }));
}

#[tokio::test]
async fn groups_and_clear() {
    let manager = manager();
    let tx = manager
        .begin(&[StoreName::Groups], Mode::ReadWrite, Strategy::New)
        .await
        .expect("begin");
    LocalStore::new(&tx, StoreName::Groups)
        .put(json!({"id": 4, "name": "Work"}), None)
        .await
        .expect("put group");
    tx.commit().await.expect("commit");

    let services = LocalServices::new(&manager);
    let groups = services.find_groups().await.expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(
        services
            .get_group(4)
            .await
            .expect("get")
            .map(|group| group.name),
        Some("Work".to_string())
    );

    services.save_secret(secret(4, "a")).await.expect("save");
    services.clear().await.expect("clear");
    assert!(services.find_groups().await.expect("groups").is_empty());
    assert!(!services.is_dirty().await.expect("dirty"));
    assert!(services.get_sync_status().await.expect("status").is_none());
}
