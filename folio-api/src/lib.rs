//! HTTP surface of the portfolio content service.
//!
//! # Routes
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | GET | `/api/content` | none |
//! | POST | `/api/admin/login` | none |
//! | POST | `/api/admin/logout` | none |
//! | GET, PUT | `/api/admin/content` | session |
//! | GET | `/api/admin/content/{section}` | session |
//! | GET | `/api/admin/export` | session |
//! | GET | `/api/admin/me` | none |
//!
//! Every write replaces the whole content document. There is no partial
//! update route, so a client saving one section still sends everything.
//!
//! # Configuration
//!
//! Read from the environment (and `.env`), see [`config::Config`]. The
//! defaults are only fit for local use: set `ADMIN_PASS_HASH` (or
//! `ADMIN_PASS`) and `SESSION_SECRET` before deploying.
//!
//! ```sh
//! ADMIN_PASS=hunter2 SESSION_SECRET=$(openssl rand -hex 32) RUST_LOG=info folio-api
//! ```
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue,
        header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
    },
    routing::{get, post},
};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c, time::interval};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use config::Config;
use routes::{
    admin_content_handler, admin_section_handler, export_handler, login_handler, logout_handler,
    me_handler, public_content_handler, replace_content_handler,
};
use state::AppState;

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/content", get(public_content_handler))
        .route("/api/admin/login", post(login_handler))
        .route("/api/admin/logout", post(logout_handler))
        .route(
            "/api/admin/content",
            get(admin_content_handler).put(replace_content_handler),
        )
        .route("/api/admin/content/{section}", get(admin_section_handler))
        .route("/api/admin/export", get(export_handler))
        .route("/api/admin/me", get(me_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading configuration...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config);

    if !state.repository.exists().await {
        info!(
            "No content file at {:?} yet; run `folio` to seed one.",
            state.repository.path()
        );
    }

    spawn_session_sweeper(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Portfolio CMS running at http://localhost:{}", state.config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = state.sessions.purge_expired();
            if purged > 0 {
                debug!(purged, "Purged expired sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
