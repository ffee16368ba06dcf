#![allow(dead_code)]

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

use shoppy_cart::config::AppConfig;
use shoppy_cart::entities::{connect, seed_admin, setup_schema};
use shoppy_cart::{create_api_router, AppState};

pub const ADMIN_EMAIL: &str = "admin@shoppy.test";
pub const ADMIN_PASSWORD: &str = "Muzion15";

pub struct TestApp {
    pub address: String,
    pub client: Client,
}

/// Serves a fresh router backed by an in-memory database on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let config = AppConfig::from_lookup(|name| match name {
        "DATABASE_URL" => Some("sqlite::memory:".to_owned()),
        "BIND_ADDR" => Some("127.0.0.1:0".to_owned()),
        "SECRET" => Some("integration-secret".to_owned()),
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_owned()),
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_owned()),
        _ => None,
    })
    .expect("config");

    let db = connect(&config.database_url).await.expect("connect");
    setup_schema(&db).await.expect("schema");
    seed_admin(&db, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("admin seed");

    let app = create_api_router(AppState::new(Arc::new(db), &config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("bind");
    let address = format!("http://{}", listener.local_addr().expect("local addr"));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    TestApp {
        address,
        client: Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("register request")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    /// Registers a shopper and returns their bearer token.
    pub async fn shopper_token(&self, email: &str) -> String {
        let response = self.register("Shopper", email, "Secret15").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        token_of(response).await
    }

    pub async fn admin_token(&self) -> String {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        token_of(response).await
    }

    /// Creates a product through the admin API and returns its id.
    pub async fn create_product(&self, admin: &str, name: &str, price_cents: i64, stock: i32) -> i64 {
        let response = self
            .client
            .post(self.url("/api/products"))
            .bearer_auth(admin)
            .json(&json!({
                "name": name,
                "description": format!("{name} for testing"),
                "price_cents": price_cents,
                "stock": stock,
                "category": "Electronics",
            }))
            .send()
            .await
            .expect("create product request");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_of(response).await;
        body["data"]["product"]["id"].as_i64().expect("product id")
    }
}

pub async fn body_of(response: Response) -> Value {
    response.json::<Value>().await.expect("json body")
}

async fn token_of(response: Response) -> String {
    let body = body_of(response).await;
    body["data"]["token"]
        .as_str()
        .expect("token in response")
        .to_owned()
}
