//! The collection side: beacon endpoint, tracker script, health check.
//! Ingestion never requires authentication and always answers with the
//! pixel, even when the hit is dropped.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::db;
use crate::domain::NewHit;
use crate::error::Result;
use crate::state::AppState;

// 1x1 transparent GIF
const PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0xff, 0x00, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

const BEACON_JS: &str = include_str!("../../static/a.js");

/// Beacon query parameters. Everything is optional: a malformed beacon
/// still gets its pixel, recording whatever fields were usable.
#[derive(Debug, Deserialize, Default)]
pub struct HitParams {
    pub site: Option<String>,
    pub path: Option<String>,
    #[serde(rename = "ref")]
    pub referrer: Option<String>,
    pub lang: Option<String>,
    pub w: Option<String>,
    pub s: Option<String>,
}

/// GET /hit
pub async fn record_hit(
    State(state): State<AppState>,
    Query(params): Query<HitParams>,
    headers: HeaderMap,
) -> Result<Response> {
    let site = params.site.unwrap_or_default().trim().to_lowercase();
    if site.is_empty() {
        debug!("Dropping hit without site attribution");
        return Ok(pixel_response());
    }

    let path = match params.path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "/".to_string(),
    };

    // Width must be a positive integer; anything else is recorded as
    // absent rather than rejected.
    let w = params
        .w
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0);

    let country = client_ip(&headers).and_then(|ip| state.geo.lookup(&ip));

    let hit = NewHit {
        ts: Utc::now().timestamp(),
        site,
        path,
        referrer: params.referrer.unwrap_or_default(),
        ua: user_agent(&headers),
        lang: params.lang.unwrap_or_default(),
        w,
        session: params.s.unwrap_or_default(),
        country,
    };

    db::insert_hit(&state.pool, &hit).await?;

    Ok(pixel_response())
}

fn pixel_response() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/gif"),
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, max-age=0",
            ),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        PIXEL_GIF,
    )
        .into_response()
}

/// GET /a.js
pub async fn beacon_script() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        BEACON_JS,
    )
        .into_response()
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Client IP from proxy headers: first X-Forwarded-For entry, then
/// X-Real-IP. Direct socket addresses are not consulted; deployments
/// sit behind a reverse proxy.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    None
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
