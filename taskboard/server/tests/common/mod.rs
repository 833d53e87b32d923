#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use taskboard_server::assist::{CompletionService, DisabledCompletionService};
use taskboard_server::auth::{User, UserService, encode_jwt};
use taskboard_server::config::Config;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret";

/// Fresh in-memory database with the schema applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> Config {
    Config {
        db_url: "sqlite::memory:".to_string(),
        port: 0,
        jwt_secret: JWT_SECRET.to_string(),
        frontend_url: None,
        openai_api_key: None,
        openai_base_url: "http://localhost".to_string(),
        openai_model: "test-model".to_string(),
    }
}

pub async fn register_user(db: &DatabaseConnection, name: &str, email: &str) -> User {
    UserService::new(db)
        .register(name, email, "secret123")
        .await
        .expect("Failed to register user")
}

pub struct TestApp {
    pub app: Router,
    pub db: Arc<DatabaseConnection>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_completion(Arc::new(DisabledCompletionService)).await
    }

    pub async fn with_completion(completion: Arc<dyn CompletionService>) -> Self {
        let db = Arc::new(setup_db().await.expect("Failed to setup database"));
        let app = taskboard_server::web::create_app(&test_config(), db.clone(), completion);
        Self { app, db }
    }

    /// Registers a user directly in the store and returns a bearer token for it.
    pub async fn token_for(&self, name: &str, email: &str) -> String {
        let user = register_user(&self.db, name, email).await;
        encode_jwt(user.id, JWT_SECRET).expect("Failed to encode token")
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, T) {
        let (status, bytes) = self.send(method, uri, token, body).await;
        let parsed = serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            panic!(
                "Failed to parse response body {:?}: {}",
                String::from_utf8_lossy(&bytes),
                err
            )
        });
        (status, parsed)
    }
}
