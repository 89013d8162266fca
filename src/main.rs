// src/main.rs

use std::{process::ExitCode, sync::Arc};

use newsbot::{
    config::{Config, DashboardConfig},
    error::AppError,
    gemini::Explainer,
    routes,
    state::AppState,
    store::{PgPostStore, PostRepository},
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (.env first, if present)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match telemetry::init(&config, "dashboard.log") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Dashboard stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Config) -> Result<(), AppError> {
    let dashboard = DashboardConfig::from_env()?;

    if dashboard.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; keyword explanations will report an error");
    }

    let store = PgPostStore::new(config.database.clone());

    // Not fatal: the page reports database failures per request.
    match store.count_by_subreddit().await {
        Ok(counts) => tracing::info!("Database reachable, {} forums stored", counts.len()),
        Err(e) => tracing::warn!("Database not reachable yet: {}", e),
    }

    let explainer = Explainer::new(dashboard.gemini_api_url.clone(), dashboard.gemini_api_key.clone())?;

    let state = AppState {
        store: Arc::new(store) as Arc<dyn PostRepository>,
        explainer,
        config: dashboard.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(dashboard.bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("cannot bind {}: {}", dashboard.bind_addr, e)))?;
    tracing::info!("Listening on {}", dashboard.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}
