use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;

use drumyard_api::app::{build_app, services::AppServices};
use drumyard_infra::InventoryConfig;
use drumyard_inventory::GridLayout;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn in_memory() -> Self {
        Self::spawn(AppServices::in_memory(GridLayout::default()).await.unwrap()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(client: &reqwest::Client, srv: &TestServer, drum: &str, order: &str) -> Value {
    let res = client
        .post(srv.url("/drums"))
        .json(&json!({ "drum_id": drum, "order_ref": order, "material_ref": "M1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn place(client: &reqwest::Client, srv: &TestServer, drum: &str, grid: &str) -> reqwest::Response {
    client
        .post(srv.url(&format!("/drums/{drum}/place")))
        .json(&json!({ "grid_id": grid }))
        .send()
        .await
        .unwrap()
}

async fn get_json(client: &reqwest::Client, srv: &TestServer, path: &str) -> Value {
    let res = client.get(srv.url(path)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK, "GET {path}");
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::in_memory().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn drum_lifecycle_register_place_retrieve() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let drum = register(&client, &srv, "D001", "O-100").await;
    assert_eq!(drum["id"], "D001");
    assert_eq!(drum["status"], "OUT");
    assert!(drum["current_grid"].is_null());

    let res = place(&client, &srv, "D001", "A1").await;
    assert_eq!(res.status(), StatusCode::OK);
    let txn: Value = res.json().await.unwrap();
    assert_eq!(txn["direction"], "IN");
    assert_eq!(txn["grid_id"], "A1");

    let drum = get_json(&client, &srv, "/drums/D001").await;
    assert_eq!(drum["status"], "IN");
    assert_eq!(drum["current_grid"], "A1");

    let available = get_json(&client, &srv, "/grids?available=true").await;
    assert_eq!(available.as_array().unwrap().len(), 8);

    let res = client
        .post(srv.url("/drums/D001/retrieve"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let history: Value = res.json().await.unwrap();
    assert_eq!(history["order_ref"], "O-100");
    assert_eq!(history["material_ref"], "M1");
    assert_eq!(history["grid_id"], "A1");

    let drum = get_json(&client, &srv, "/drums/D001").await;
    assert_eq!(drum["status"], "OUT");
    assert_eq!(drum["order_ref"], "");

    let log = get_json(&client, &srv, "/transactions?drum_id=D001").await;
    let directions: Vec<&str> = log
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["direction"].as_str().unwrap())
        .collect();
    assert_eq!(directions, vec!["IN", "OUT"]);

    let history = get_json(&client, &srv, "/history").await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let audit = get_json(&client, &srv, "/audit").await;
    assert_eq!(audit["consistent"], true);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "D1", "O").await;
    register(&client, &srv, "D2", "O").await;

    let res = place(&client, &srv, "D404", "A1").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "drum_not_found");

    assert_eq!(place(&client, &srv, "D1", "A1").await.status(), StatusCode::OK);

    let res = place(&client, &srv, "D2", "A1").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "grid_unavailable");

    let res = place(&client, &srv, "D1", "A2").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "drum_already_placed");

    let res = client
        .post(srv.url("/drums/D2/retrieve"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "drum_not_placed");

    let res = place(&client, &srv, "D2", "A 1").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "grid_unavailable");

    let res = place(&client, &srv, "D2", " ").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    let res = client
        .post(srv.url("/drums"))
        .json(&json!({ "order_ref": "O" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/drums/NOPE")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn drums_filter_by_order() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "D1", "O-1").await;
    register(&client, &srv, "D2", "O-2").await;
    register(&client, &srv, "D3", "O-1").await;

    let all = get_json(&client, &srv, "/drums").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let o1 = get_json(&client, &srv, "/drums?order_ref=O-1").await;
    let ids: Vec<&str> = o1
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["D1", "D3"]);

    assert_eq!(place(&client, &srv, "D2", "A1").await.status(), StatusCode::OK);
    let res = client.post(srv.url("/drums/D2/retrieve")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let blank = get_json(&client, &srv, "/drums?order_ref=").await;
    assert!(blank.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reset_clears_everything() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "D1", "O").await;
    assert_eq!(place(&client, &srv, "D1", "C3").await.status(), StatusCode::OK);

    let res = client.post(srv.url("/admin/reset")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let snapshot = get_json(&client, &srv, "/snapshot").await;
    assert!(snapshot["drums"].as_array().unwrap().is_empty());
    let grids = snapshot["grids"].as_array().unwrap();
    assert_eq!(grids.len(), 9);
    assert!(grids.iter().all(|g| g["status"] == "Available"));

    assert!(get_json(&client, &srv, "/transactions").await.as_array().unwrap().is_empty());
    assert!(get_json(&client, &srv, "/history").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_backed_server_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let config = InventoryConfig {
        database_url: format!("sqlite://{}", dir.path().join("api.db").display()),
        ..InventoryConfig::default()
    };
    let client = reqwest::Client::new();

    {
        let srv = TestServer::spawn(AppServices::from_config(&config).await.unwrap()).await;
        register(&client, &srv, "D9", "O-9").await;
        assert_eq!(place(&client, &srv, "D9", "B1").await.status(), StatusCode::OK);
    }

    let srv = TestServer::spawn(AppServices::from_config(&config).await.unwrap()).await;
    let drum = get_json(&client, &srv, "/drums/D9").await;
    assert_eq!(drum["current_grid"], "B1");
    assert_eq!(drum["order_ref"], "O-9");
}
