//! Autocomplete request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /autocomplete`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AutocompleteRequest {
    /// Document text preceding the cursor.
    pub code_context: String,
    /// Zero-based cursor line.
    pub cursor_line: u32,
    /// Zero-based cursor column.
    pub cursor_column: u32,
    /// Language of the document (e.g. `"python"`).
    pub language: String,
}

/// Response body for `POST /autocomplete`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutocompleteResponse {
    /// Text to insert at the cursor.
    pub suggestion: String,
}
