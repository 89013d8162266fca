use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::DashboardConfig, gemini::Explainer, store::PostRepository};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostRepository>,
    pub explainer: Explainer,
    pub config: DashboardConfig,
}

impl FromRef<AppState> for Arc<dyn PostRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Explainer {
    fn from_ref(state: &AppState) -> Self {
        state.explainer.clone()
    }
}

impl FromRef<AppState> for DashboardConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
