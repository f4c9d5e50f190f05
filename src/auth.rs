//! Bearer-token gate for the stats API. Ingestion routes never pass
//! through here.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::{Error, Result};
use crate::state::AppState;

/// Reject any request whose Authorization header does not carry the
/// configured token. With no token configured, every request is
/// rejected; there is no open mode.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let expected = match state.settings.api_token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Err(Error::Unauthorized),
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(Error::Unauthorized),
    }
}
