use crate::db::errors::{DbError, USERS_EMAIL_UNIQUE};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated, but not allowed to perform the operation
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The operation needs a higher subscription tier
    #[error("{feature} requires the Pro plan")]
    PlanRequired { feature: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found, or owned by someone else
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Daily generation quota exhausted
    #[error("Rate limit exceeded ({current}/{limit} on plan {plan})")]
    RateLimited { current: i32, limit: i32, plan: String },

    /// Payment provider webhook failed signature verification
    #[error("Invalid webhook signature: {reason}")]
    InvalidSignature { reason: String },

    /// An external provider (AI or payment) failed
    #[error("Upstream {service} error: {message}")]
    Upstream { service: &'static str, message: String },

    /// Feature is not configured on this deployment
    #[error("{feature} is not configured")]
    NotConfigured { feature: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } | Error::PlanRequired { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } | Error::InvalidSignature { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::NotConfigured { .. } => StatusCode::NOT_IMPLEMENTED,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Unauthorized".to_string()),
            Error::Forbidden { message } => message.clone(),
            Error::PlanRequired { feature } => {
                format!("{feature} is only available for Pro users. Upgrade to unlock this feature.")
            }
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::RateLimited { .. } => "Rate limit exceeded".to_string(),
            Error::InvalidSignature { .. } => "Webhook signature verification failed".to_string(),
            Error::Upstream { service, .. } => format!("The {service} provider failed. Please try again."),
            Error::NotConfigured { feature } => format!("{feature} is not available on this deployment"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, constraint, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(USERS_EMAIL_UNIQUE)) => "User with this email already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) | Error::Upstream { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } | Error::InvalidSignature { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::PlanRequired { .. } | Error::RateLimited { .. } => {
                tracing::info!("Plan gate rejected request: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::NotConfigured { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "error": self.user_message() });

        (status, Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::PlanRequired {
                feature: "Export".to_string()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::RateLimited {
                current: 3,
                limit: 3,
                plan: "Free".to_string()
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            Error::InvalidSignature {
                reason: "bad".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Upstream {
                service: "AI",
                message: "timeout".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_details_are_not_leaked() {
        let err = Error::Upstream {
            service: "AI",
            message: "sk-secret-key rejected by upstream".to_string(),
        };
        assert!(!err.user_message().contains("sk-secret"));
    }

    #[test]
    fn test_rate_limited_message() {
        let err = Error::RateLimited {
            current: 3,
            limit: 3,
            plan: "Free".to_string(),
        };
        assert_eq!(err.user_message(), "Rate limit exceeded");
    }
}
