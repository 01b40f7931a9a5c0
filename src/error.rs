//! Application error types
//!
//! Every fallible operation in the service returns [`AppResult`]. Errors are
//! grouped by where they originate so the HTTP layer can pick a status code
//! without inspecting messages.

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Errors caused by the caller's input or identity
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("{message}")]
    Authentication { message: String },

    #[error("Webhook rejected: {message}")]
    InvalidWebhook { message: String },

    #[error("A record with {field} '{value}' already exists")]
    Conflict { field: String, value: String },
}

/// Errors reported by, or while talking to, an external provider
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{provider} request failed: {message}")]
    PaymentProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },

    #[error("{carrier} request failed: {message}")]
    ShippingProvider { carrier: String, message: String },

    #[error("{provider} rejected the request: {message}")]
    ProviderRejected {
        provider: String,
        code: Option<String>,
        message: String,
    },

    #[error("{service} did not respond within {seconds} seconds")]
    Timeout { service: String, seconds: u64 },
}

/// Errors the operator has to fix
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Error)]
pub enum AppErrorKind {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

#[derive(Debug)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub context: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::Validation {
            message: message.into(),
        }))
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::Authentication {
            message: message.into(),
        }))
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::InvalidWebhook {
            message: message.into(),
        }))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: message.into(),
            },
        ))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Infrastructure(InfrastructureError::Internal {
            message: message.into(),
        }))
    }

    pub fn payment_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::External(ExternalError::PaymentProvider {
            provider: provider.into(),
            message: message.into(),
            is_retryable: false,
        }))
    }

    pub fn shipping_provider(carrier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::External(ExternalError::ShippingProvider {
            carrier: carrier.into(),
            message: message.into(),
        }))
    }

    pub fn provider_rejected(
        provider: impl Into<String>,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(AppErrorKind::External(ExternalError::ProviderRejected {
            provider: provider.into(),
            code,
            message: message.into(),
        }))
    }

    pub fn timeout(service: impl Into<String>, seconds: u64) -> Self {
        Self::new(AppErrorKind::External(ExternalError::Timeout {
            service: service.into(),
            seconds,
        }))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.kind {
            AppErrorKind::Domain(e) => match e {
                DomainError::Validation { .. } | DomainError::InvalidWebhook { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Authentication { .. } => StatusCode::UNAUTHORIZED,
                DomainError::Conflict { .. } => StatusCode::CONFLICT,
            },
            AppErrorKind::External(e) => match e {
                ExternalError::PaymentProvider { .. } | ExternalError::ShippingProvider { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                ExternalError::ProviderRejected { .. } => StatusCode::BAD_REQUEST,
                ExternalError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            },
            AppErrorKind::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable tag sent alongside the detail message
    pub fn code(&self) -> &'static str {
        match &self.kind {
            AppErrorKind::Domain(DomainError::Validation { .. }) => "validation_error",
            AppErrorKind::Domain(DomainError::NotFound { .. }) => "not_found",
            AppErrorKind::Domain(DomainError::Authentication { .. }) => "authentication_error",
            AppErrorKind::Domain(DomainError::InvalidWebhook { .. }) => "invalid_webhook",
            AppErrorKind::Domain(DomainError::Conflict { .. }) => "conflict",
            AppErrorKind::External(ExternalError::ProviderRejected { .. }) => "provider_rejected",
            AppErrorKind::External(ExternalError::Timeout { .. }) => "provider_timeout",
            AppErrorKind::External(_) => "provider_error",
            AppErrorKind::Infrastructure(InfrastructureError::Configuration { .. }) => {
                "configuration_error"
            }
            AppErrorKind::Infrastructure(_) => "internal_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::External(ExternalError::PaymentProvider { is_retryable, .. }) => {
                *is_retryable
            }
            AppErrorKind::External(ExternalError::Timeout { .. }) => true,
            AppErrorKind::Infrastructure(InfrastructureError::Database(e)) => e.is_retryable(),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.kind, context),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::new(AppErrorKind::Domain(err))
    }
}

impl From<ExternalError> for AppError {
    fn from(err: ExternalError) -> Self {
        Self::new(AppErrorKind::External(err))
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match &err.kind {
            DatabaseErrorKind::NotFound { entity, id } => Self::not_found(entity.clone(), id.clone()),
            DatabaseErrorKind::Duplicate { column, value } => {
                Self::new(AppErrorKind::Domain(DomainError::Conflict {
                    field: column.clone(),
                    value: value.clone(),
                }))
            }
            _ => Self::new(AppErrorKind::Infrastructure(InfrastructureError::Database(err))),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(code = self.code(), status = status.as_u16(), "Request rejected: {}", self);
        }

        // Database internals stay in the logs
        let detail = match &self.kind {
            AppErrorKind::Infrastructure(InfrastructureError::Database(_)) => {
                "Database operation failed".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(serde_json::json!({
            "detail": detail,
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_family() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::configuration("missing key").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::shipping_provider("DHL", "HTTP 500").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::provider_rejected("HyperPay", Some("200.300.404".into()), "invalid")
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::timeout("Stripe", 30).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_context_is_appended_to_message() {
        let err = AppError::payment_provider("Stripe", "HTTP 500").with_context("create session");
        assert_eq!(
            err.to_string(),
            "Stripe request failed: HTTP 500 (create session)"
        );
    }

    #[test]
    fn test_database_not_found_maps_to_domain_not_found() {
        let db_err = DatabaseError::not_found("Order", "abc");
        let err: AppError = db_err.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
