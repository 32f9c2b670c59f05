// tests/pipeline_flow.rs
//
// Precisam de um Postgres: `TEST_DATABASE_URL=... cargo test -- --ignored`

mod common;

use axum::{
    http::{Method, StatusCode},
    Router,
};
use serde_json::json;

use common::{app, create_landing, send, send_with_headers};

#[tokio::test]
#[ignore]
async fn landing_lead_is_won_with_commission() {
    let app = app().await;
    let (landing_id, api_key) = create_landing(&app, "ventanas").await;

    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(json!({ "nombre": "Ana", "telefono": "611 222 333" })),
        &[("x-api-key", api_key.as_str()), ("x-forwarded-for", "203.0.113.7, 10.0.0.1")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    let lead_id = body["leadId"].as_i64().unwrap();

    let (status, lead) = send(&app, Method::GET, &format!("/api/leads/{lead_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lead["state"], "nuevo");
    assert_eq!(lead["source"], "landing");
    assert_eq!(lead["landingId"].as_i64(), Some(landing_id));
    assert_eq!(lead["phone"], "611222333");
    assert_eq!(lead["originIp"], "203.0.113.7");
    assert_eq!(lead["activities"].as_array().unwrap().len(), 1);
    assert_eq!(lead["activities"][0]["kind"], "creacion");

    let (status, won) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{lead_id}/estado"),
        Some(json!({ "estado": "ganado", "importeVenta": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{won}");
    assert_eq!(won["state"], "ganado");
    assert_eq!(won["saleAmount"].as_f64(), Some(1000.0));
    assert_eq!(won["commissionAmount"].as_f64(), Some(100.0));
    assert!(won["saleDate"].is_string());

    let (status, activities) =
        send(&app, Method::GET, &format!("/api/leads/{lead_id}/actividad"), None).await;
    assert_eq!(status, StatusCode::OK);
    let activities = activities.as_array().unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["kind"], "venta_cerrada");
    assert_eq!(activities[0]["previousState"], "nuevo");
    assert_eq!(activities[0]["newState"], "ganado");
}

#[tokio::test]
#[ignore]
async fn inactive_landing_or_missing_key_is_unauthorized() {
    let app = app().await;
    let (landing_id, api_key) = create_landing(&app, "inactiva").await;
    let submission = json!({ "nombre": "Luis", "telefono": "622333444" });

    let (status, _) = send(&app, Method::POST, "/api/public/leads", Some(submission.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/landings/{landing_id}"),
        Some(json!({ "activa": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(submission),
        &[("x-api-key", api_key.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("details").is_none());
}

#[tokio::test]
#[ignore]
async fn invalid_submission_reports_every_field() {
    let app = app().await;
    let (_, api_key) = create_landing(&app, "validacion").await;

    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(json!({ "nombre": "A", "telefono": "123", "email": "no-es-email" })),
        &[("x-api-key", api_key.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "nombre", "telefono"]);
}

#[tokio::test]
#[ignore]
async fn won_without_any_amount_leaves_the_lead_untouched() {
    let app = app().await;

    let (status, lead) = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(json!({ "nombre": "Marta", "telefono": "633444555" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");
    assert_eq!(lead["source"], "directo");
    let lead_id = lead["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{lead_id}/estado"),
        Some(json!({ "estado": "ganado" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, detail) = send(&app, Method::GET, &format!("/api/leads/{lead_id}"), None).await;
    assert_eq!(detail["state"], "nuevo");
    assert!(detail["commissionAmount"].is_null());
    assert_eq!(detail["activities"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn manual_creation_cannot_forge_landing_source() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(json!({ "nombre": "Pedro", "telefono": "644555666", "fuente": "landing" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "fuente");
}

#[tokio::test]
#[ignore]
async fn bulk_state_change_logs_one_activity_per_lead() {
    let app = app().await;

    let mut ids = Vec::new();
    for (nombre, telefono) in [("Eva", "655666777"), ("Raúl", "666777888")] {
        let (status, lead) = send(
            &app,
            Method::POST,
            "/api/leads",
            Some(json!({ "nombre": nombre, "telefono": telefono })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(lead["id"].as_i64().unwrap());
    }

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/leads/bulk",
        Some(json!({ "ids": [ids[0], ids[1], ids[0]], "action": "updateState", "value": "contactado" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["count"], 2);

    for id in &ids {
        let (_, activities) = send(&app, Method::GET, &format!("/api/leads/{id}/actividad"), None).await;
        let activities = activities.as_array().unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0]["kind"], "cambio_estado");
        assert_eq!(activities[0]["newState"], "contactado");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/leads/bulk",
        Some(json!({ "ids": ids, "action": "updateState" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// Ids que nenhum BIGSERIAL alcança
const MISSING_ID: i64 = i64::MAX - 7;

async fn create_lead(app: &Router, nombre: &str, telefono: &str) -> i64 {
    let (status, lead) = send(
        app,
        Method::POST,
        "/api/leads",
        Some(json!({ "nombre": nombre, "telefono": telefono })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");
    lead["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore]
async fn bulk_won_mints_commission_for_recorded_sales() {
    let app = app().await;
    let with_sale = create_lead(&app, "Nuria", "677888999").await;
    let without_sale = create_lead(&app, "Óscar", "688999000").await;

    let (status, lead) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{with_sale}"),
        Some(json!({ "importeVenta": 900 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{lead}");
    assert!(lead["commissionAmount"].is_null());

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/leads/bulk",
        Some(json!({ "ids": [with_sale, without_sale], "action": "updateState", "value": "ganado" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["count"], 2);

    let (_, won) = send(&app, Method::GET, &format!("/api/leads/{with_sale}"), None).await;
    assert_eq!(won["state"], "ganado");
    assert_eq!(won["saleAmount"].as_f64(), Some(900.0));
    assert_eq!(won["commissionAmount"].as_f64(), Some(90.0));

    let (_, bare) = send(&app, Method::GET, &format!("/api/leads/{without_sale}"), None).await;
    assert_eq!(bare["state"], "ganado");
    assert!(bare["saleAmount"].is_null());
    assert!(bare["commissionAmount"].is_null());
}

#[tokio::test]
#[ignore]
async fn bulk_state_change_counts_only_existing_leads() {
    let app = app().await;
    let first = create_lead(&app, "Irene", "600111222").await;
    let second = create_lead(&app, "Jaime", "600222333").await;

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/leads/bulk",
        Some(json!({ "ids": [first, MISSING_ID, second, MISSING_ID - 1], "action": "updateState", "value": "reunion" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["count"], 2);

    for id in [first, second] {
        let (_, activities) = send(&app, Method::GET, &format!("/api/leads/{id}/actividad"), None).await;
        let activities = activities.as_array().unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0]["newState"], "reunion");
        assert_eq!(activities[0]["metadata"]["bulk"], true);
    }
}

#[tokio::test]
#[ignore]
async fn transition_of_a_missing_lead_is_not_found() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{MISSING_ID}/estado"),
        Some(json!({ "estado": "ganado", "importeVenta": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/leads/{MISSING_ID}/actividad"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn oversized_sale_amount_is_a_bad_request() {
    let app = app().await;
    let lead_id = create_lead(&app, "Sara", "600333444").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{lead_id}/estado"),
        Some(json!({ "estado": "ganado", "importeVenta": 10_000_000_000_000u64 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "importeVenta");

    let (_, detail) = send(&app, Method::GET, &format!("/api/leads/{lead_id}"), None).await;
    assert_eq!(detail["state"], "nuevo");
    assert_eq!(detail["activities"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn bulk_delete_removes_leads_with_their_history() {
    let app = app().await;
    let first = create_lead(&app, "Teresa", "600444555").await;
    let second = create_lead(&app, "Ulises", "600555666").await;

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/leads/bulk",
        Some(json!({ "ids": [first, second, MISSING_ID], "action": "delete" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["count"], 2);

    for id in [first, second] {
        let (status, _) = send(&app, Method::GET, &format!("/api/leads/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("/api/leads/{id}/actividad"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
#[ignore]
async fn deleting_a_landing_keeps_its_leads() {
    let app = app().await;
    let (landing_id, api_key) = create_landing(&app, "borrada").await;

    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(json!({ "nombre": "Víctor", "telefono": "600666777" })),
        &[("x-api-key", api_key.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let lead_id = body["leadId"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/landings/{landing_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, lead) = send(&app, Method::GET, &format!("/api/leads/{lead_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lead["landingId"].is_null());
    assert_eq!(lead["source"], "landing");
}

#[tokio::test]
#[ignore]
async fn regenerated_key_revokes_the_old_one() {
    let app = app().await;
    let (landing_id, old_key) = create_landing(&app, "rotada").await;

    let (status, landing) = send(
        &app,
        Method::POST,
        &format!("/api/landings/{landing_id}/regenerate-key"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{landing}");
    let new_key = landing["apiKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let submission = json!({ "nombre": "Wendy", "telefono": "600777888" });
    let (status, _) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(submission.clone()),
        &[("x-api-key", old_key.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/public/leads",
        Some(submission),
        &[("x-api-key", new_key.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
#[ignore]
async fn health_answers_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
