//! HTTP request handlers for the web adapter.

use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;

use crate::domain::pipeline::{self, PipelineOutput};

use super::{AppState, WebError};

#[derive(Debug, serde::Deserialize)]
pub struct InterpretRequest {
    #[serde(default)]
    pub text: String,
}

/// `POST /api/groq`: free-text rule in, `{dsl, ast, python, backtest}` out.
pub async fn interpret_rule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<PipelineOutput>, WebError> {
    if request.text.trim().is_empty() {
        return Err(WebError::bad_request("missing 'text' field"));
    }

    info!(chars = request.text.len(), "rule request received");
    let dsl = state.language.interpret(&request.text)?;
    let output = pipeline::run(&dsl, &state.bars, &state.run_config)?;
    Ok(Json(output))
}
