//! SQLite event store: the single write path plus the flat group-by
//! metrics that SQL can answer directly. Session-derived metrics fetch
//! raw rows here and aggregate in [`crate::metrics`].

use crate::domain::{
    ActiveCountry, ActiveVisitors, CountryCount, Granularity, HitId, HostnameCount, HourCount,
    LanguageCount, NewHit, PageviewTotals, PathCount, ReferrerCount, ScreenWidthCount, SessionHit,
    TimeBucket,
};
use crate::error::Result;
use crate::site::SiteScope;

pub type Pool = sqlx::SqlitePool;
pub type PoolOptions = sqlx::sqlite::SqlitePoolOptions;

pub async fn create_pool(url: &str) -> Result<Pool> {
    let pool = PoolOptions::new().max_connections(10).connect(url).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    let sql = include_str!("../../migrations/001_initial.sql");
    sqlx::raw_sql(sql).execute(pool).await?;
    Ok(())
}

/// Scope plus optional inclusive time range shared by every read query.
#[derive(Debug, Clone)]
pub struct HitFilter {
    pub scope: SiteScope,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl HitFilter {
    pub fn new(scope: SiteScope, start: Option<i64>, end: Option<i64>) -> Self {
        Self { scope, start, end }
    }

    fn start_bound(&self) -> i64 {
        self.start.unwrap_or(0)
    }

    fn end_bound(&self) -> i64 {
        self.end.unwrap_or(i64::MAX)
    }
}

// Every read query carries the same scope predicate: exact root match or
// any subdomain of it, then the inclusive time range.
const SCOPE_CLAUSE: &str = "(site = ? OR site LIKE ?) AND ts >= ? AND ts <= ?";

// Distinct-session counts must ignore hits whose session token is empty;
// NULLIF drops them from COUNT(DISTINCT ...).
const DISTINCT_SESSIONS: &str = "COUNT(DISTINCT NULLIF(session, ''))";

/// Record one hit. An empty site is unattributable and is dropped
/// without error so the beacon response stays cheap and uniform.
pub async fn insert_hit(pool: &Pool, hit: &NewHit) -> Result<Option<HitId>> {
    if hit.site.trim().is_empty() {
        return Ok(None);
    }

    let result = sqlx::query(
        r#"INSERT INTO hits (ts, site, path, ref, ua, lang, w, session, country)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(hit.ts)
    .bind(&hit.site)
    .bind(&hit.path)
    .bind(&hit.referrer)
    .bind(&hit.ua)
    .bind(&hit.lang)
    .bind(hit.w)
    .bind(&hit.session)
    .bind(&hit.country)
    .execute(pool)
    .await?;

    Ok(Some(HitId(result.last_insert_rowid())))
}

pub async fn pageview_totals(pool: &Pool, filter: &HitFilter) -> Result<PageviewTotals> {
    if filter.scope.is_empty() {
        return Ok(PageviewTotals::default());
    }

    let sql = format!("SELECT COUNT(*), {DISTINCT_SESSIONS} FROM hits WHERE {SCOPE_CLAUSE}");
    let (views, sessions): (i64, i64) = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .fetch_one(pool)
        .await?;

    Ok(PageviewTotals { views, sessions })
}

pub async fn top_pages(pool: &Pool, filter: &HitFilter, limit: i64) -> Result<Vec<PathCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT path, COUNT(*) AS views FROM hits WHERE {SCOPE_CLAUSE}
         GROUP BY path ORDER BY views DESC, path ASC LIMIT ?"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(path, views)| PathCount { path, views })
        .collect())
}

/// Top external referrers. Empty referrers and self-referrals (any
/// referrer mentioning the scoped root domain) are excluded.
pub async fn top_referrers(
    pool: &Pool,
    filter: &HitFilter,
    limit: i64,
) -> Result<Vec<ReferrerCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT ref, COUNT(*) AS views FROM hits WHERE {SCOPE_CLAUSE}
         AND ref != '' AND ref NOT LIKE ?
         GROUP BY ref ORDER BY views DESC, ref ASC LIMIT ?"
    );
    let self_referral = format!("%{}%", filter.scope.root());
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(self_referral)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(referrer, views)| ReferrerCount { referrer, views })
        .collect())
}

/// Views and distinct sessions per UTC calendar bucket, oldest first.
pub async fn timeseries(
    pool: &Pool,
    filter: &HitFilter,
    granularity: Granularity,
) -> Result<Vec<TimeBucket>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let bucket = granularity.bucket_expr();
    let sql = format!(
        "SELECT {bucket} AS bucket, COUNT(*) AS views, {DISTINCT_SESSIONS} AS sessions
         FROM hits WHERE {SCOPE_CLAUSE}
         GROUP BY bucket ORDER BY bucket ASC"
    );
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(bucket, views, sessions)| TimeBucket {
            bucket,
            views,
            sessions,
        })
        .collect())
}

pub async fn top_languages(
    pool: &Pool,
    filter: &HitFilter,
    limit: i64,
) -> Result<Vec<LanguageCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT lang, COUNT(*) AS views FROM hits WHERE {SCOPE_CLAUSE} AND lang != ''
         GROUP BY lang ORDER BY views DESC, lang ASC LIMIT ?"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(lang, views)| LanguageCount { lang, views })
        .collect())
}

pub async fn top_countries(
    pool: &Pool,
    filter: &HitFilter,
    limit: i64,
) -> Result<Vec<CountryCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT country, COUNT(*) AS views FROM hits
         WHERE {SCOPE_CLAUSE} AND country IS NOT NULL AND country != ''
         GROUP BY country ORDER BY views DESC, country ASC LIMIT ?"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(country, views)| CountryCount { country, views })
        .collect())
}

/// Per-hostname breakdown: the exact `site` values recorded within the
/// scope, so subdomain traffic stays distinguishable.
pub async fn top_hostnames(
    pool: &Pool,
    filter: &HitFilter,
    limit: i64,
) -> Result<Vec<HostnameCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT site, COUNT(*) AS views FROM hits WHERE {SCOPE_CLAUSE}
         GROUP BY site ORDER BY views DESC, site ASC LIMIT ?"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(site, views)| HostnameCount { site, views })
        .collect())
}

pub async fn screen_widths(
    pool: &Pool,
    filter: &HitFilter,
    limit: i64,
) -> Result<Vec<ScreenWidthCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT w, COUNT(*) AS views FROM hits WHERE {SCOPE_CLAUSE} AND w IS NOT NULL AND w > 0
         GROUP BY w ORDER BY views DESC, w ASC LIMIT ?"
    );
    let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(width, views)| ScreenWidthCount { width, views })
        .collect())
}

/// The ten busiest UTC hours of day across the filtered range.
pub async fn peak_hours(pool: &Pool, filter: &HitFilter) -> Result<Vec<HourCount>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT CAST(strftime('%H', ts, 'unixepoch') AS INTEGER) AS hour, COUNT(*) AS views
         FROM hits WHERE {SCOPE_CLAUSE}
         GROUP BY hour ORDER BY views DESC, hour ASC LIMIT 10"
    );
    let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(hour, views)| HourCount { hour, views })
        .collect())
}

/// Sessions with at least one hit in the trailing window, total and
/// per country, both as distinct session counts.
pub async fn active_visitors(
    pool: &Pool,
    scope: &SiteScope,
    window_seconds: i64,
    now: i64,
) -> Result<ActiveVisitors> {
    if scope.is_empty() {
        return Ok(ActiveVisitors {
            active: 0,
            window_seconds,
            countries: Vec::new(),
        });
    }

    let cutoff = now - window_seconds;

    let sql = format!(
        "SELECT {DISTINCT_SESSIONS} FROM hits
         WHERE (site = ? OR site LIKE ?) AND ts >= ?"
    );
    let (active,): (i64,) = sqlx::query_as(&sql)
        .bind(scope.root())
        .bind(scope.subdomain_pattern())
        .bind(cutoff)
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT country, {DISTINCT_SESSIONS} AS sessions FROM hits
         WHERE (site = ? OR site LIKE ?) AND ts >= ?
         AND country IS NOT NULL AND country != '' AND session != ''
         GROUP BY country ORDER BY sessions DESC, country ASC"
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(scope.root())
        .bind(scope.subdomain_pattern())
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

    Ok(ActiveVisitors {
        active,
        window_seconds,
        countries: rows
            .into_iter()
            .map(|(country, sessions)| ActiveCountry { country, sessions })
            .collect(),
    })
}

/// Raw user-agent strings of every hit in the filter, for the device,
/// browser, and OS breakdowns.
pub async fn fetch_user_agents(pool: &Pool, filter: &HitFilter) -> Result<Vec<String>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!("SELECT ua FROM hits WHERE {SCOPE_CLAUSE}");
    let rows: Vec<(String,)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(ua,)| ua).collect())
}

/// The hit projection consumed by sessionization. Hits without a
/// session token are filtered here since no metric can use them.
pub async fn fetch_session_hits(pool: &Pool, filter: &HitFilter) -> Result<Vec<SessionHit>> {
    if filter.scope.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, ts, session, path FROM hits WHERE {SCOPE_CLAUSE} AND session != ''"
    );
    let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(&sql)
        .bind(filter.scope.root())
        .bind(filter.scope.subdomain_pattern())
        .bind(filter.start_bound())
        .bind(filter.end_bound())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, ts, session, path)| SessionHit {
            id,
            ts,
            session,
            path,
        })
        .collect())
}
