//! Leadflow Backend
//!
//! Lead intake, scoring and pipeline engine for a home-services sales team, served over
//! REST with SQLite persistence.

mod api;
mod config;
mod db;
mod engine;
mod errors;
mod events;
mod models;
mod service;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use events::EventBus;
use service::{BulkCoordinator, LeadService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub leads: Arc<LeadService>,
    pub bulk: Arc<BulkCoordinator>,
}

impl AppState {
    /// Wire the services around one repository.
    pub fn new(repo: Arc<Repository>, config: &Config) -> Self {
        let leads = Arc::new(LeadService::new(
            repo.clone(),
            repo.clone(),
            EventBus::new(),
        ));
        let bulk = Arc::new(BulkCoordinator::new(leads.clone(), config.bulk_concurrency));
        Self { repo, leads, bulk }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Leadflow Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Bulk concurrency: {}", config.bulk_concurrency);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let settings = repo.load_settings().await?;
    engine::validate_settings(&settings)?;
    tracing::info!(
        pipeline_mode = ?settings.pipeline_mode,
        strategy = settings.assignment.strategy.as_str(),
        "Engine settings loaded"
    );

    let state = AppState::new(repo, &config);

    // Log lead events for as long as the server runs
    let mut events = state.leads.events().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(?event, "Lead event");
        }
    });

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        // Intake
        .route("/intake/{step}/validate", post(api::validate_intake_step))
        .route("/duplicates/check", post(api::check_duplicates))
        // Leads
        .route("/leads", get(api::list_leads).post(api::create_lead))
        .route("/leads/bulk", post(api::bulk_leads))
        .route("/leads/{id}", get(api::get_lead))
        .route("/leads/{id}/status", put(api::update_lead_status))
        .route("/leads/{id}/assignment", put(api::update_lead_assignment))
        .route("/leads/{id}/auto-assign", post(api::auto_assign_lead))
        .route("/leads/{id}/rescore", post(api::rescore_lead))
        // Members
        .route("/members", get(api::list_members).post(api::create_member))
        .route(
            "/members/{id}",
            get(api::get_member)
                .put(api::update_member)
                .delete(api::delete_member),
        )
        // Customers
        .route("/customers", get(api::list_customers).post(api::create_customer))
        // Settings
        .route("/settings", get(api::get_settings).put(api::update_settings));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
