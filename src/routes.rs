// src/routes.rs

use axum::{
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// CORS do painel: origens configuradas, ou qualquer uma se a lista estiver vazia.
fn admin_cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}

pub fn build_router(app_state: AppState) -> Router {
    let lead_routes = Router::new()
        .route("/",
               get(handlers::leads::list_leads)
               .post(handlers::leads::create_lead)
        )
        .route("/bulk", post(handlers::leads::bulk_action))
        .route("/{id}",
               get(handlers::leads::get_lead)
               .put(handlers::leads::update_lead)
               .delete(handlers::leads::delete_lead)
        )
        .route("/{id}/estado", put(handlers::leads::change_state))
        .route("/{id}/actividad",
               get(handlers::activities::list_activities)
               .post(handlers::activities::create_activity)
        );

    let landing_routes = Router::new()
        .route("/",
               get(handlers::landings::list_landings)
               .post(handlers::landings::create_landing)
        )
        .route("/{id}",
               get(handlers::landings::get_landing)
               .put(handlers::landings::update_landing)
               .delete(handlers::landings::delete_landing)
        )
        .route("/{id}/regenerate-key", post(handlers::landings::regenerate_key));

    let expense_routes = Router::new()
        .route("/",
               get(handlers::expenses::list_expenses)
               .post(handlers::expenses::create_expense)
        )
        .route("/{id}",
               get(handlers::expenses::get_expense)
               .put(handlers::expenses::update_expense)
               .delete(handlers::expenses::delete_expense)
        );

    // Chamado pelas landings de qualquer domínio
    let public_routes = Router::new()
        .route("/api/public/leads", post(handlers::public::ingest_lead))
        .layer(CorsLayer::permissive());

    let admin_routes = Router::new()
        .nest("/leads", lead_routes)
        .nest("/landings", landing_routes)
        .nest("/gastos", expense_routes)
        .route("/balance", get(handlers::reports::get_balance))
        .route("/dashboard", get(handlers::reports::get_dashboard))
        .route("/settings",
               get(handlers::settings::get_settings)
               .put(handlers::settings::update_settings)
        )
        .layer(admin_cors(&app_state.config.cors_allowed_origins));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(public_routes)
        .nest("/api", admin_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
