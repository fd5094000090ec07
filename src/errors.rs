use http::StatusCode;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// Simplified error payload handed to presentation collaborators
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Stable machine-readable kind (e.g., "invalid_transition")
    pub kind: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(
        "Cannot change {document} status from '{from}' to '{to}'. Allowed: {}.",
        format_allowed(.allowed)
    )]
    InvalidTransition {
        document: String,
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error(
        "Cannot modify {document} details unless in Draft (changed: {}).",
        .fields.join(", ")
    )]
    ImmutableFieldChanged {
        document: String,
        fields: Vec<String>,
    },

    #[error("Cannot modify line items unless {document} is in Draft (current status: {status})")]
    ParentNotDraft { document: String, status: String },

    #[error("Cannot delete {document} unless it is in Draft (current status: {status})")]
    NotDraft { document: String, status: String },

    #[error(
        "All line items of {goods_receipt} must have an expiry date before closing (missing: {}).",
        .lines.join(", ")
    )]
    MissingExpiryDates {
        goods_receipt: String,
        lines: Vec<String>,
    },

    #[error(
        "Only submitted purchase orders can be received; {purchase_order} is '{status}'"
    )]
    POStatusNotSubmitted {
        purchase_order: String,
        status: String,
    },

    #[error("Cannot delete {0}: it is referenced by protected records")]
    ReferencedEntityProtected(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

fn format_allowed(allowed: &[String]) -> String {
    if allowed.is_empty() {
        "None".to_string()
    } else {
        allowed.join(", ")
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a database error; usable directly in `map_err`.
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// Stable snake_case label, used for metrics and the `kind` field of responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::ImmutableFieldChanged { .. } => "immutable_field_changed",
            Self::ParentNotDraft { .. } => "parent_not_draft",
            Self::NotDraft { .. } => "not_draft",
            Self::MissingExpiryDates { .. } => "missing_expiry_dates",
            Self::POStatusNotSubmitted { .. } => "po_status_not_submitted",
            Self::ReferencedEntityProtected(_) => "referenced_entity_protected",
            Self::InternalError(_) => "internal_error",
            Self::Other(_) => "other",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_)
        )
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. }
            | Self::ImmutableFieldChanged { .. }
            | Self::ParentNotDraft { .. }
            | Self::NotDraft { .. }
            | Self::POStatusNotSubmitted { .. }
            | Self::ReferencedEntityProtected(_) => StatusCode::CONFLICT,
            Self::MissingExpiryDates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let status = self.status_code();
        ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            kind: self.kind().to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
