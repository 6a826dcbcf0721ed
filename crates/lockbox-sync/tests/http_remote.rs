use lockbox_core::{ChangeLog, ChangeOp, Error, RemoteId, StoreName};
use lockbox_sync::{HttpRemote, Remote};
use mockito::{Matcher, Server};
use serde_json::json;

fn remote(server: &Server) -> HttpRemote {
    HttpRemote::new(reqwest::Client::new(), server.url())
}

#[tokio::test]
async fn list_vaults_reads_meta() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/meta")
        .with_status(200)
        .with_body(json!([{"id": 1, "name": "Personal"}, {"id": "team"}]).to_string())
        .create_async()
        .await;

    let vaults = remote(&server).list_vaults().await.expect("vaults");

    mock.assert_async().await;
    assert_eq!(vaults.len(), 2);
    assert_eq!(vaults[0].id, RemoteId::Int(1));
    assert_eq!(vaults[0].attributes.get("name"), Some(&json!("Personal")));
    assert_eq!(vaults[1].id, RemoteId::Text("team".to_string()));
}

#[tokio::test]
async fn fetch_sends_vault_and_cursor() {
    let mut server = Server::new_async().await;
    let body = json!({
        "vault": {"id": 3},
        "snapshots": [
            {"id": 8, "delta": "{\"secrets\":{\"insert\":[{\"id\":1,\"groupId\":1}]}}"}
        ]
    });
    let mock = server
        .mock("GET", "/fetch")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vaultId".into(), "3".into()),
            Matcher::UrlEncoded("sinceCommitId".into(), "7".into()),
        ]))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let fetched = remote(&server)
        .fetch_changes(&RemoteId::Int(3), Some(&RemoteId::Int(7)))
        .await
        .expect("fetch");

    mock.assert_async().await;
    assert_eq!(fetched.vault.id, RemoteId::Int(3));
    assert_eq!(fetched.snapshots.len(), 1);
    let delta = fetched.snapshots[0].changes().expect("delta");
    assert_eq!(delta.touched_keys(StoreName::Secrets).len(), 1);
}

#[tokio::test]
async fn first_fetch_omits_cursor() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/fetch")
        .match_query(Matcher::Exact("vaultId=vault%201".to_string()))
        .with_status(200)
        .with_body(json!({"vault": {"id": "vault 1"}, "snapshots": []}).to_string())
        .create_async()
        .await;

    let fetched = remote(&server)
        .fetch_changes(&RemoteId::Text("vault 1".to_string()), None)
        .await
        .expect("fetch");

    mock.assert_async().await;
    assert!(fetched.snapshots.is_empty());
}

#[tokio::test]
async fn push_posts_change_log() {
    let mut server = Server::new_async().await;
    let mut changes = ChangeLog::new();
    changes.record(
        StoreName::Secrets,
        ChangeOp::Insert,
        json!({"id": 1, "groupId": 2, "resource": "mail"}),
    );
    changes.record(StoreName::Secrets, ChangeOp::Delete, json!(4));

    let mock = server
        .mock("POST", "/save")
        .match_query(Matcher::UrlEncoded("vaultId".into(), "3".into()))
        .match_body(Matcher::Json(json!({
            "secrets": {
                "insert": [{"id": 1, "groupId": 2, "resource": "mail"}],
                "delete": [4]
            }
        })))
        .with_status(200)
        .with_body(json!({"id": 9, "delta": ""}).to_string())
        .create_async()
        .await;

    let snapshot = remote(&server)
        .push_changes(&RemoteId::Int(3), &changes)
        .await
        .expect("push");

    mock.assert_async().await;
    assert_eq!(snapshot.id, RemoteId::Int(9));
}

#[tokio::test]
async fn error_status_carries_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/meta")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let err = remote(&server).list_vaults().await.expect_err("forbidden");
    match err {
        Error::Remote { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_serialization_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/meta")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = remote(&server).list_vaults().await.expect_err("bad body");
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let remote = HttpRemote::new(reqwest::Client::new(), "http://127.0.0.1:1");

    let err = remote.list_vaults().await.expect_err("unreachable");
    assert!(matches!(err, Error::Network(_)));
}
