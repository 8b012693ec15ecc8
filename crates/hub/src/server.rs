//! HTTP surface of the hub: router assembly and the shared handler state.
use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::HubConfig;
use crate::db::DbClient;
use crate::request_logging::log_hub_request;
use crate::secrets::SecretCipher;

mod api_types;
mod auth;
mod error;
mod identities;
mod tracker_mapping;
mod trackers;


#[derive(Debug, Clone)]
pub struct HubState {
    pub db: DbClient,
}

/// Opens the database and serves the API until the listener fails.
///
/// # Errors
/// Returns an error if the database, session store or listener cannot be set up.
pub async fn run(config: &HubConfig) -> Result<()> {
    let database_path = config.database_path();
    let bind_address = config.bind_address();
    let mut db = DbClient::initialize(&database_path).await?;
    if let Some(raw_key) = config.secret_key() {
        let cipher = SecretCipher::from_base64_key(&raw_key)
            .context("TRACKER_HUB_SECRET_KEY must be a base64 encoded 32 byte key")?;
        db = db.with_secret_cipher(cipher);
    } else {
        tracing::warn!("no secret key configured; identities with passwords cannot be created");
    }

    let app = build_router(HubState { db }, config.secure_cookies()).await?;
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::info!(%bind_address, %database_path, "tracker hub listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the full router, creating the session table on first use.
///
/// # Errors
/// Returns an error if the session store migration fails.
pub async fn build_router(state: HubState, secure_cookies: bool) -> Result<Router> {
    let session_store = SqliteStore::new(state.db.pool());
    session_store.migrate().await?;
    let session_layer = SessionManagerLayer::new(session_store).with_secure(secure_cookies);

    Ok(Router::new()
        .route("/api/auth/setup", post(auth::auth_setup))
        .route("/api/auth/login", post(auth::auth_login))
        .route("/api/auth/logout", post(auth::auth_logout))
        .route("/api/auth/status", get(auth::auth_status))
        .route(
            "/trackers",
            get(trackers::list_trackers).post(trackers::create_tracker),
        )
        .route("/trackers/", get(trackers::list_trackers))
        .route(
            "/trackers/:id",
            get(trackers::get_tracker)
                .put(trackers::update_tracker)
                .delete(trackers::delete_tracker),
        )
        .route(
            "/identities",
            get(identities::list_identities).post(identities::create_identity),
        )
        .route(
            "/identities/:id",
            get(identities::get_identity).delete(identities::delete_identity),
        )
        .layer(middleware::from_fn(log_hub_request))
        .layer(session_layer)
        .with_state(state))
}
