//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Query of the listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive name search, recursive.
    pub text: Option<String>,
}

/// Single-entry update (`PUT /files/:id`).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameRequest {
    /// Only `rename` is supported.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub operation: String,
    /// New name.
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
}

/// Batch update (`PUT /files`).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    /// `move` or `copy`.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub operation: String,
    /// Destination folder id.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub target: String,
    /// Entries to move or copy.
    #[validate(length(min = 1, message = "At least one id is required"))]
    pub ids: Vec<String>,
}

/// Entry creation (`POST /files/:id`).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    /// `file` or `folder`.
    #[serde(rename = "type")]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub kind: String,
}

/// Batch removal (`DELETE /files`).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteRequest {
    #[validate(length(min = 1, message = "At least one id is required"))]
    pub ids: Vec<String>,
}

/// Query of `GET /direct`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DirectQuery {
    /// File id.
    pub id: String,
    /// Present (any value) to force an attachment download.
    pub download: Option<String>,
}

/// Query of `POST /upload`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Destination folder id, the root when absent.
    pub id: Option<String>,
}

/// Query of `GET /preview`.
///
/// Dimensions are kept as text: anything unparseable falls back to the
/// default size instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    pub id: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}
