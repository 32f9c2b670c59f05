// tests/common/mod.rs

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use leadflow::{
    routes::build_router,
    services::commission::CommissionRate,
    AppConfig, AppState,
};

/// Router real sobre o banco de `TEST_DATABASE_URL`, com as migrações aplicadas.
pub async fn app() -> Router {
    let database_url =
        std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL deve apontar para um Postgres de teste");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("falha ao conectar no banco de teste");
    sqlx::migrate!().run(&pool).await.expect("falha nas migrações");

    let config = AppConfig {
        database_url,
        bind_addr: ([127, 0, 0, 1], 0).into(),
        db_max_connections: 5,
        db_acquire_timeout: Duration::from_secs(3),
        commission_rate: CommissionRate::default(),
        default_page_size: 20,
        max_page_size: 500,
        cors_allowed_origins: Vec::new(),
    };

    build_router(AppState::new(pool, config))
}

/// Slug único por teste; os testes rodam em paralelo no mesmo banco.
pub fn unique_slug(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

pub async fn send_with_headers(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Cria uma landing ativa e devolve (id, api_key).
pub async fn create_landing(app: &Router, prefix: &str) -> (i64, String) {
    let slug = unique_slug(prefix);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/landings",
        Some(serde_json::json!({ "nombre": format!("Landing {slug}"), "slug": slug })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["id"].as_i64().unwrap(),
        body["apiKey"].as_str().unwrap().to_string(),
    )
}
