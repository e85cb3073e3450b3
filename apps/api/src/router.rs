use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use dialogue_cell::DialogueOrchestrator;
use shared_models::{AppError, ChatRequest, ChatResponse};

pub fn create_router(orchestrator: Arc<DialogueOrchestrator>) -> Router {
    Router::new()
        .route("/", get(|| async { "Haneul Hospital chat API is running!" }))
        .route("/chat", post(chat))
        .with_state(orchestrator)
}

async fn chat(
    State(orchestrator): State<Arc<DialogueOrchestrator>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.session_id.trim().is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }
    Ok(Json(orchestrator.handle_message(request).await))
}
