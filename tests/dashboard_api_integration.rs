use std::sync::Arc;

use dashboard_versioning::{run_server, InMemoryStore};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

// Test client wrapper for making API calls as one caller
struct TestClient {
    client: Client,
    base_url: String,
    user_id: String,
    domain_id: String,
}

impl TestClient {
    fn new(base_url: &str, user_id: &str, domain_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            user_id: user_id.to_string(),
            domain_id: domain_id.to_string(),
        }
    }

    fn with_identity(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-user-id", &self.user_id)
            .header("x-domain-id", &self.domain_id)
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.with_identity(self.client.post(format!("{}{}", self.base_url, path)))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.with_identity(self.client.get(format!("{}{}", self.base_url, path)))
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.with_identity(self.client.delete(format!("{}{}", self.base_url, path)))
            .send()
            .await
    }

    async fn patch(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.with_identity(self.client.patch(format!("{}{}", self.base_url, path)))
            .json(&json)
            .send()
            .await
    }
}

/// Start a server on an ephemeral port and return its base URL
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(run_server(Arc::new(InMemoryStore::new()), listener));
    format!("http://{}", address)
}

async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_dashboard_version_workflow() {
    let base_url = spawn_server().await;
    let client = TestClient::new(&base_url, "u1", "domain-1");

    println!("1. Creating dashboard...");
    let response = client
        .post(
            "/dashboards",
            json!({
                "name": "Cost overview",
                "dashboard_type": "DASHBOARD",
                "layouts": [{"widget": "chart"}],
                "settings": {"theme": "light"},
                "labels": ["finops", "finops"]
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["dashboard_id"].as_str().unwrap().to_string();
    assert_eq!(created["version"], json!(1));
    assert_eq!(created["labels"], json!(["finops"]));
    assert_eq!(created["viewers"], json!("PUBLIC"));

    println!("2. Updating settings only...");
    let response = client
        .patch(&format!("/dashboards/{}", id), json!({"settings": {"refresh": 30}}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["version"], json!(1));
    assert_eq!(updated["settings"], json!({"theme": "light", "refresh": 30}));

    println!("3. Updating layouts...");
    let updated = json_body(
        client
            .patch(
                &format!("/dashboards/{}", id),
                json!({"layouts": [{"widget": "table"}]}),
            )
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["version"], json!(2));

    println!("4. Listing versions...");
    let list = json_body(client.get(&format!("/dashboards/{}/versions", id)).await.unwrap()).await;
    assert_eq!(list["total_count"], json!(2));
    assert_eq!(list["current_version"], json!(2));
    assert_eq!(list["results"][0]["version"], json!(2));
    assert_eq!(list["results"][0]["latest"], json!(true));
    assert_eq!(list["results"][1]["latest"], json!(false));

    println!("5. Projecting a version...");
    let version = json_body(
        client
            .get(&format!("/dashboards/{}/versions/1?only=layouts,latest", id))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(version, json!({"layouts": [{"widget": "chart"}], "latest": false}));

    println!("6. Reverting to version 1...");
    let response = client
        .post(&format!("/dashboards/{}/versions/1/revert", id), json!({}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reverted = json_body(response).await;
    assert_eq!(reverted["version"], json!(3));
    assert_eq!(reverted["layouts"], json!([{"widget": "chart"}]));

    println!("7. Deleting versions...");
    let response = client
        .delete(&format!("/dashboards/{}/versions/3", id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], json!("LATEST_VERSION"));

    let response = client
        .delete(&format!("/dashboards/{}/versions/2", id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    println!("8. Deleting the dashboard...");
    let response = client.delete(&format!("/dashboards/{}", id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = client.get(&format!("/dashboards/{}", id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = client
        .get(&format!("/dashboards/{}/versions/1", id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_dashboards_and_listing() {
    let base_url = spawn_server().await;
    let owner = TestClient::new(&base_url, "u1", "domain-1");
    let other = TestClient::new(&base_url, "u2", "domain-1");

    let private = json_body(
        owner
            .post(
                "/dashboards",
                json!({"name": "Payroll", "dashboard_type": "DASHBOARD", "viewers": "PRIVATE"}),
            )
            .await
            .unwrap(),
    )
    .await;
    let id = private["dashboard_id"].as_str().unwrap().to_string();
    owner
        .post("/dashboards", json!({"name": "Costs", "dashboard_type": "DASHBOARD"}))
        .await
        .unwrap();

    let response = other.get(&format!("/dashboards/{}", id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], json!("PERMISSION_DENIED"));

    let response = other
        .patch(&format!("/dashboards/{}", id), json!({"name": "Mine now"}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let list = json_body(owner.get("/dashboards?keyword=pay").await.unwrap()).await;
    assert_eq!(list["total_count"], json!(1));
    assert_eq!(list["results"][0]["name"], json!("Payroll"));

    let list = json_body(owner.get("/dashboards?sort=name&limit=1").await.unwrap()).await;
    assert_eq!(list["total_count"], json!(2));
    assert_eq!(list["results"].as_array().unwrap().len(), 1);
    assert_eq!(list["results"][0]["name"], json!("Costs"));

    let list = json_body(other.get("/dashboards").await.unwrap()).await;
    assert_eq!(list["total_count"], json!(0));

    let search = json_body(
        owner
            .post(
                "/dashboards/search",
                json!({"query": {"filter": [{"k": "viewers", "v": "PRIVATE", "o": "eq"}]}}),
            )
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(search["total_count"], json!(1));

    let stat = json_body(
        owner
            .post("/dashboards/stat", json!({"group_by": ["viewers"]}))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(stat["results"].as_array().unwrap().len(), 2);

    let response = owner
        .post("/dashboards/search", json!({"query": {"filter": [{"k": "password", "v": "x"}]}}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let base_url = spawn_server().await;
    let response = Client::new()
        .get(format!("{}/dashboards", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
