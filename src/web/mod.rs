//! HTTP surface - axum router, shared state and server lifecycle.

pub mod api;
pub mod auth;
pub mod error;
pub mod pages;
pub mod templates;

use crate::{
    config::{app::AppConfig, envinfo::EnvInfo},
    errors::Result,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tera::Tera;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub envinfo: Arc<EnvInfo>,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Bundles the shared state, compiling the page templates.
    pub fn new(db: DatabaseConnection, config: AppConfig, envinfo: EnvInfo) -> Result<Self> {
        Ok(Self {
            db: Arc::new(db),
            config: Arc::new(config),
            envinfo: Arc::new(envinfo),
            templates: Arc::new(templates::load_templates()?),
        })
    }
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/teams", get(api::list_teams).post(api::create_team))
        .route("/teams/:team_id", put(api::rename_team).delete(api::delete_team))
        .route("/users", get(api::list_users))
        .route(
            "/users/:user_id/team",
            put(api::set_membership).delete(api::remove_membership),
        )
        .route("/services", get(api::list_services).post(api::save_service))
        .route("/services/:service_id", axum::routing::delete(api::delete_service))
        .route("/boxes", get(api::list_boxes).post(api::save_box))
        .route("/boxes/:box_id", axum::routing::delete(api::delete_box))
        .route(
            "/competition",
            get(api::get_competition).put(api::update_competition),
        )
        .route("/competition/reset", post(api::reset_competition))
        .route("/service-matrix", get(api::service_history))
        .route("/scores", post(api::add_adjustment))
        .route("/checks", post(api::record_check))
        .route("/injects", get(api::list_injects).post(api::save_inject))
        .route("/injects/:inject_id", axum::routing::delete(api::delete_inject))
        .route("/injects/:inject_id/submissions", get(api::list_submissions))
        .route("/submissions/:submission_id/grade", put(api::grade_submission))
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::homepage))
        .route("/info", get(pages::info_page))
        .route("/injects", get(pages::injects_page))
        .route("/injects/:inject_id", get(pages::inject_page))
        .route("/api/scoreboard", get(api::scoreboard))
        .route(
            "/api/injects/:inject_id/submissions",
            post(api::submit_inject),
        )
        .nest("/api/admin", admin_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.bind_addr;
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
