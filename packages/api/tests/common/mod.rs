// ABOUTME: Common test utilities for API integration tests
// ABOUTME: Provides test server setup on a temp database and HTTP helpers that send X-User-Id

use casebook_api::{create_app, DbState};
use casebook_storage::{init_pool_with_path, PoolSettings};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const USER_HEADER: &str = "X-User-Id";

/// Test context containing server URL and database pool
pub struct TestContext {
    pub base_url: String,
    #[allow(dead_code)]
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    pub _temp_dir: TempDir,
}

/// Start the full app on a random port with an isolated database
pub async fn setup_test_server() -> TestContext {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("casebook.db");

    let pool = init_pool_with_path(&db_path, &PoolSettings::default())
        .await
        .expect("Failed to create database pool");

    let (state, _worker) = DbState::with_dispatcher(pool.clone());
    let app = create_app(state, "http://localhost:5173").expect("valid CORS origin");

    // Bind to random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestContext {
        base_url,
        pool,
        client: reqwest::Client::new(),
        _temp_dir: temp_dir,
    }
}

impl TestContext {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET without identifying the caller
    #[allow(dead_code)]
    pub async fn get_anonymous(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to make GET request")
    }

    pub async fn get(&self, path: &str, user_id: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(USER_HEADER, user_id)
            .send()
            .await
            .expect("Failed to make GET request")
    }

    pub async fn post(&self, path: &str, user_id: &str, body: Option<Value>) -> reqwest::Response {
        let request = self.client.post(self.url(path)).header(USER_HEADER, user_id);
        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };
        request.send().await.expect("Failed to make POST request")
    }

    #[allow(dead_code)]
    pub async fn put(&self, path: &str, user_id: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header(USER_HEADER, user_id)
            .json(&body)
            .send()
            .await
            .expect("Failed to make PUT request")
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, user_id: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header(USER_HEADER, user_id)
            .send()
            .await
            .expect("Failed to make DELETE request")
    }

    /// Register a user through the API and return its id
    pub async fn create_user(&self, name: &str, email: &str, role: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({ "name": name, "email": email, "role": role }))
            .send()
            .await
            .expect("Failed to create user");
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a draft requirement as `author_id` and return its id
    #[allow(dead_code)]
    pub async fn create_requirement(&self, project_id: &str, author_id: &str, title: &str) -> String {
        let response = self
            .post(
                &format!("/api/projects/{}/requirements", project_id),
                author_id,
                Some(json!({ "title": title, "priority": "HIGH" })),
            )
            .await;
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Poll a user's notifications until `expected` have arrived.
    ///
    /// Delivery runs on a background worker, so the HTTP call that caused it
    /// returns before the rows exist.
    #[allow(dead_code)]
    pub async fn wait_for_notifications(&self, user_id: &str, expected: usize) -> Value {
        let path = format!("/api/users/{}/notifications", user_id);
        for _ in 0..100 {
            let body: Value = self.get(&path, user_id).await.json().await.unwrap();
            if body["data"]["data"].as_array().map(Vec::len).unwrap_or(0) >= expected {
                return body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("{} never received {} notification(s)", user_id, expected);
    }
}

/// Read the `data` field of a success envelope
#[allow(dead_code)]
pub async fn data(response: reqwest::Response) -> Value {
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true, "unexpected body: {}", body);
    body["data"].clone()
}

/// Read the error code of a failure envelope
#[allow(dead_code)]
pub async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false, "unexpected body: {}", body);
    body["error"]["code"].as_str().unwrap().to_string()
}
