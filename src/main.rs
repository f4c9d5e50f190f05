use std::net::SocketAddr;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nanolytics::{cache::AppCache, config::Settings, db, geo::CountryResolver, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.api_token.as_deref().map_or(true, str::is_empty) {
        warn!("No API token configured; stats endpoints will reject all requests");
    }

    let db_url = settings.database_url();
    info!("Connecting to database...");
    let pool = db::create_pool(&db_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    let geo = CountryResolver::new(settings.maxmind_country_db.as_deref());
    if geo.is_available() {
        info!("GeoIP country lookup available");
    } else {
        info!("GeoIP country lookup not available (no database file)");
    }

    let cache = AppCache::new(&settings);

    let addr = SocketAddr::new(
        settings.host.parse().unwrap_or([0, 0, 0, 0].into()),
        settings.port,
    );

    let state = AppState::new(pool, cache, settings, geo);
    let app = nanolytics::router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
