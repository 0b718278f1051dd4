use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use luxstay::config::AppConfig;
use luxstay::db;
use luxstay::handlers;
use luxstay::state::AppState;
use luxstay::store::sqlite::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        store: Arc::new(SqliteStore::new(Arc::new(Mutex::new(conn)))),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/hotels", get(handlers::hotels::list_hotels))
        .route(
            "/api/hotels/featured",
            get(handlers::hotels::featured_hotels),
        )
        .route("/api/hotels/:id", get(handlers::hotels::get_hotel))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/my", get(handlers::bookings::my_bookings))
        .route("/api/users/profile", get(handlers::users::get_profile))
        .route("/api/users/profile", put(handlers::users::update_profile))
        .route("/api/users/favorites", get(handlers::users::get_favorites))
        .route(
            "/api/users/favorites/toggle",
            post(handlers::users::toggle_favorite),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
