//! Text-completion stub.

use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AutocompleteRequest, AutocompleteResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ServerError};

/// Suggestion returned for every well-formed request.
const STUB_SUGGESTION: &str = "print('Hello World')";

/// `POST /autocomplete`: Suggest text to insert at the cursor.
///
/// Always returns the same suggestion; no completion model is wired in.
///
/// # Errors
///
/// Returns [`ServerError::InvalidRequest`] if `code_context` or
/// `language` is empty.
#[utoipa::path(
    post,
    path = "/api/v1/autocomplete",
    tag = "Autocomplete",
    summary = "Suggest a completion",
    request_body = AutocompleteRequest,
    responses(
        (status = 200, description = "Suggested completion", body = AutocompleteResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn autocomplete(
    Json(req): Json<AutocompleteRequest>,
) -> Result<Json<AutocompleteResponse>, ServerError> {
    if req.code_context.is_empty() {
        return Err(ServerError::InvalidRequest(
            "code_context must not be empty".to_string(),
        ));
    }
    if req.language.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "language must not be empty".to_string(),
        ));
    }

    tracing::debug!(
        language = %req.language,
        line = req.cursor_line,
        column = req.cursor_column,
        "autocomplete requested"
    );
    Ok(Json(AutocompleteResponse {
        suggestion: STUB_SUGGESTION.to_string(),
    }))
}

/// Autocomplete routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/autocomplete", post(autocomplete))
}
