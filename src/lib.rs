pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod geo;
pub mod ingress;
pub mod metrics;
pub mod site;
pub mod state;
pub mod ua;

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Full application router: open collection routes plus the
/// token-gated stats API.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    let stats_api = Router::new()
        .route("/api/pageviews", get(api::pageviews))
        .route("/api/pages", get(api::pages))
        .route("/api/referrers", get(api::referrers))
        .route("/api/timeseries", get(api::timeseries))
        .route("/api/devices", get(api::devices))
        .route("/api/browsers", get(api::browsers))
        .route("/api/oses", get(api::oses))
        .route("/api/languages", get(api::languages))
        .route("/api/countries", get(api::countries))
        .route("/api/hostnames", get(api::hostnames))
        .route("/api/active", get(api::active))
        .route("/api/entry-pages", get(api::entry_pages))
        .route("/api/exit-pages", get(api::exit_pages))
        .route("/api/peak-hours", get(api::peak_hours))
        .route("/api/bounce-rates", get(api::bounce_rates))
        .route("/api/screen-widths", get(api::screen_widths))
        .route("/api/session-duration", get(api::session_duration))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(ingress::health))
        .route("/hit", get(ingress::record_hit))
        .route("/a.js", get(ingress::beacon_script))
        .merge(stats_api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
