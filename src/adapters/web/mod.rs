//! Web server adapter.
//!
//! Exposes the rule pipeline over HTTP: `POST /api/groq` takes a free-text
//! rule, delegates the natural-language step to the configured
//! [`LanguagePort`], runs the pipeline and returns the four response
//! fields as JSON. Failures map to distinct non-2xx statuses with a JSON
//! error body surfaced verbatim.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::InterpretRequest;

use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::bar::Bar;
use crate::domain::engine::RunConfig;
use crate::ports::language_port::LanguagePort;

pub struct AppState {
    pub language: Arc<dyn LanguagePort + Send + Sync>,
    pub bars: Arc<Vec<Bar>>,
    pub run_config: RunConfig,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/groq", post(handlers::interpret_rule))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
