//! Integration tests for the API client against a mock HTTP backend

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::time::Duration;
use warehouse::{dashboard, ApiClient, ApiError, ClientConfig, RequestOptions};

const KATALOG_BODY: &str = r#"{
    "status": "success",
    "data": [{"id": "BRG-001", "nama": "Beras 5kg", "harga": 75000, "stok": 12}],
    "logs": [{"message": "katalog loaded", "data": {"rows": 1}}]
}"#;

async fn setup_test_client() -> (ApiClient, ServerGuard) {
    let server = Server::new_async().await;
    let config = ClientConfig::new(format!("{}/exec", server.url()))
        .with_retry_base_delay(Duration::ZERO)
        .with_request_timeout(Duration::from_secs(5));
    let client = ApiClient::new(config).expect("Failed to create client");
    (client, server)
}

fn path_is(path: &str) -> Matcher {
    Matcher::UrlEncoded("path".into(), path.into())
}

#[tokio::test]
async fn test_get_twice_within_ttl_makes_one_request() {
    let (client, mut server) = setup_test_client().await;

    let mock = server
        .mock("GET", "/exec")
        .match_query(path_is("katalog"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(KATALOG_BODY)
        .expect(1)
        .create_async()
        .await;

    let first = client.request("katalog", RequestOptions::get()).await.unwrap();
    let second = client.request("katalog", RequestOptions::get()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.data[0]["nama"], "Beras 5kg");
    assert_eq!(first.logs.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_without_cache_always_requests() {
    let (client, mut server) = setup_test_client().await;

    let mock = server
        .mock("GET", "/exec")
        .match_query(path_is("katalog"))
        .with_status(200)
        .with_body(KATALOG_BODY)
        .expect(2)
        .create_async()
        .await;

    client.request("katalog", RequestOptions::get().no_cache()).await.unwrap();
    client.request("katalog", RequestOptions::get().no_cache()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_backend_error_is_retried_then_surfaced() {
    let (client, mut server) = setup_test_client().await;

    let mock = server
        .mock("POST", "/exec")
        .match_query(path_is("checkout"))
        .match_header("content-type", "text/plain;charset=utf-8")
        .match_body(Matcher::PartialJson(json!({
            "path": "checkout",
            "user": "toko@contoh.id"
        })))
        .with_status(200)
        .with_body(r#"{"status": "error", "message": "Stok tidak cukup"}"#)
        .expect(3)
        .create_async()
        .await;

    let options = RequestOptions::post(json!({
        "user": "toko@contoh.id",
        "items": [{"id": "BRG-001", "qty": 99}]
    }))
    .with_retries(2);
    let err = client.request("checkout", options).await.unwrap_err();

    assert_eq!(err.to_string(), "Stok tidak cukup");
    assert!(matches!(err, ApiError::Backend { attempts: 3, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let (client, mut server) = setup_test_client().await;

    let mock = server
        .mock("GET", "/exec")
        .match_query(path_is("inventory"))
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let err = client.get("inventory").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { attempts: 3, .. }));
    assert!(err.to_string().contains("503"));
    assert!(client.cache().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_extra_path_params_become_query_params() {
    let (client, mut server) = setup_test_client().await;

    let mock = server
        .mock("GET", "/exec")
        .match_query(Matcher::AllOf(vec![
            path_is("invoice"),
            Matcher::UrlEncoded("id".into(), "INV-20240701-001".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"status": "success", "data": {"id": "INV-20240701-001", "total": 150000}}"#)
        .expect(1)
        .create_async()
        .await;

    let payload = client.get("invoice&id=INV-20240701-001").await.unwrap();

    assert_eq!(payload.data["total"], 150000);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_invalidates_cached_list() {
    let (client, mut server) = setup_test_client().await;

    let list = server
        .mock("GET", "/exec")
        .match_query(path_is("hutang"))
        .with_status(200)
        .with_body(r#"{"status": "success", "data": [{"id": "H-1", "status": "Belum Lunas"}]}"#)
        .expect(2)
        .create_async()
        .await;
    let update = server
        .mock("POST", "/exec")
        .match_query(path_is("update_status"))
        .match_body(Matcher::PartialJson(json!({"path": "update_status", "id": "H-1"})))
        .with_status(200)
        .with_body(r#"{"status": "success"}"#)
        .expect(1)
        .create_async()
        .await;

    client.get("hutang").await.unwrap();
    client.get("hutang").await.unwrap();
    let options = RequestOptions::post(json!({"type": "hutang", "id": "H-1", "status": "Lunas"}))
        .invalidate("hutang");
    client.request("update_status", options).await.unwrap();
    client.get("hutang").await.unwrap();

    list.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn test_login_payload_exposes_user_field() {
    let (client, mut server) = setup_test_client().await;

    server
        .mock("POST", "/exec")
        .match_query(path_is("login"))
        .with_status(200)
        .with_body(
            r#"{"status": "success", "user": {"email": "admin@gudang.id", "role": "admin"}}"#,
        )
        .create_async()
        .await;

    let payload = client
        .post("login", json!({"email": "admin@gudang.id", "password": "rahasia"}))
        .await
        .unwrap();

    assert_eq!(payload.field("user").unwrap()["role"], "admin");
    assert!(client.cache().is_empty(), "POST responses are never cached");
}

#[tokio::test]
async fn test_dashboard_refresh_summarizes_lists() {
    let (client, mut server) = setup_test_client().await;

    let bodies = [
        ("hutang", r#"[{"status": "Belum Lunas", "total_tagihan": 500000}]"#),
        (
            "piutang",
            r#"[{"status": "Lunas", "total_tagihan": 100}, {"status": "", "total_tagihan": 250}]"#,
        ),
        ("inventory", r#"[{"stok_akhir": 0}, {"stok_akhir": 8}]"#),
        ("vendors", r#"[{"nama": "PT Maju"}, {"nama": "CV Jaya"}]"#),
    ];
    let mut mocks = Vec::new();
    for (path, data) in bodies {
        let mock = server
            .mock("GET", "/exec")
            .match_query(path_is(path))
            .with_status(200)
            .with_body(format!(r#"{{"status": "success", "data": {}}}"#, data))
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let summary = dashboard::refresh(&client).await.unwrap();

    assert_eq!(summary.total_products, 2);
    assert_eq!(summary.out_of_stock, 1);
    assert_eq!(summary.total_payable, 500000.0);
    assert_eq!(summary.total_receivable, 250.0);
    assert_eq!(summary.total_vendors, 2);
    for mock in mocks {
        mock.assert_async().await;
    }
}
