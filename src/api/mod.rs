//! The stats API: read-only aggregate endpoints over the event store,
//! all scoped by `site` and an optional inclusive time range.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{self, HitFilter};
use crate::domain::{
    ActiveVisitors, BounceRate, CountryCount, DeviceBreakdown, EntryPageCount, ExitPageCount,
    FamilyCount, Granularity, HostnameCount, HourCount, LanguageCount, PageviewTotals, PathCount,
    ReferrerCount, ScreenWidthCount, SessionDuration, TimeBucket,
};
use crate::error::Result;
use crate::metrics;
use crate::site::SiteScope;
use crate::state::AppState;
use crate::ua::UaProfile;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 500;

const DEFAULT_WINDOW_SECONDS: i64 = 300;
const MAX_WINDOW_SECONDS: i64 = 3600;

/// Shared query parameters. Numeric fields arrive as strings and parse
/// leniently: garbage falls back to the default instead of erroring, so
/// a mistyped dashboard URL still renders something.
#[derive(Debug, Deserialize, Default)]
pub struct StatsQuery {
    #[serde(default)]
    pub site: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<String>,
    pub window: Option<String>,
    pub granularity: Option<String>,
}

impl StatsQuery {
    fn filter(&self) -> HitFilter {
        HitFilter::new(
            SiteScope::new(&self.site),
            parse_i64(self.start.as_deref()),
            parse_i64(self.end.as_deref()),
        )
    }

    fn limit(&self) -> i64 {
        parse_i64(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT)
    }

    fn window(&self) -> i64 {
        parse_i64(self.window.as_deref())
            .unwrap_or(DEFAULT_WINDOW_SECONDS)
            .clamp(1, MAX_WINDOW_SECONDS)
    }

    fn granularity(&self) -> Granularity {
        Granularity::parse(self.granularity.as_deref())
    }
}

fn parse_i64(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

async fn profiles(state: &AppState, filter: &HitFilter) -> Result<Vec<UaProfile>> {
    let uas = db::fetch_user_agents(&state.pool, filter).await?;
    Ok(uas.iter().map(|ua| state.cache.profile(ua)).collect())
}

/// GET /api/pageviews
pub async fn pageviews(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PageviewTotals>> {
    let totals = db::pageview_totals(&state.pool, &query.filter()).await?;
    Ok(Json(totals))
}

/// GET /api/pages
pub async fn pages(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<PathCount>>> {
    let pages = db::top_pages(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(pages))
}

/// GET /api/referrers
pub async fn referrers(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<ReferrerCount>>> {
    let referrers = db::top_referrers(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(referrers))
}

/// GET /api/timeseries
pub async fn timeseries(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<TimeBucket>>> {
    let buckets = db::timeseries(&state.pool, &query.filter(), query.granularity()).await?;
    Ok(Json(buckets))
}

/// GET /api/devices
pub async fn devices(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DeviceBreakdown>> {
    let profiles = profiles(&state, &query.filter()).await?;
    Ok(Json(metrics::device_breakdown(&profiles)))
}

/// GET /api/browsers
pub async fn browsers(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<FamilyCount>>> {
    let profiles = profiles(&state, &query.filter()).await?;
    Ok(Json(metrics::browser_breakdown(
        &profiles,
        query.limit() as usize,
    )))
}

/// GET /api/oses
pub async fn oses(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<FamilyCount>>> {
    let profiles = profiles(&state, &query.filter()).await?;
    Ok(Json(metrics::os_breakdown(&profiles, query.limit() as usize)))
}

/// GET /api/languages
pub async fn languages(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<LanguageCount>>> {
    let languages = db::top_languages(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(languages))
}

/// GET /api/countries
pub async fn countries(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<CountryCount>>> {
    let countries = db::top_countries(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(countries))
}

/// GET /api/hostnames
pub async fn hostnames(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<HostnameCount>>> {
    let hostnames = db::top_hostnames(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(hostnames))
}

/// GET /api/active
pub async fn active(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ActiveVisitors>> {
    let scope = SiteScope::new(&query.site);
    let now = Utc::now().timestamp();
    let visitors = db::active_visitors(&state.pool, &scope, query.window(), now).await?;
    Ok(Json(visitors))
}

/// GET /api/entry-pages
pub async fn entry_pages(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<EntryPageCount>>> {
    let hits = db::fetch_session_hits(&state.pool, &query.filter()).await?;
    let groups = metrics::sessionize(&hits);
    Ok(Json(metrics::entry_pages(&groups, query.limit() as usize)))
}

/// GET /api/exit-pages
pub async fn exit_pages(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<ExitPageCount>>> {
    let hits = db::fetch_session_hits(&state.pool, &query.filter()).await?;
    let groups = metrics::sessionize(&hits);
    Ok(Json(metrics::exit_pages(&groups, query.limit() as usize)))
}

/// GET /api/peak-hours
pub async fn peak_hours(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<HourCount>>> {
    let hours = db::peak_hours(&state.pool, &query.filter()).await?;
    Ok(Json(hours))
}

/// GET /api/bounce-rates
pub async fn bounce_rates(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<BounceRate>>> {
    let hits = db::fetch_session_hits(&state.pool, &query.filter()).await?;
    let groups = metrics::sessionize(&hits);
    Ok(Json(metrics::bounce_rates(&groups, query.limit() as usize)))
}

/// GET /api/screen-widths
pub async fn screen_widths(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<ScreenWidthCount>>> {
    let widths = db::screen_widths(&state.pool, &query.filter(), query.limit()).await?;
    Ok(Json(widths))
}

/// GET /api/session-duration
pub async fn session_duration(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<SessionDuration>> {
    let hits = db::fetch_session_hits(&state.pool, &query.filter()).await?;
    let groups = metrics::sessionize(&hits);
    Ok(Json(metrics::session_duration(&groups)))
}
