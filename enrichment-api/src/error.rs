use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use importers::ImportError;
use shared_types::{ErrorDetail, ErrorResponse};
use std::time::Duration;
use thiserror::Error;

use crate::database::StoreError;
use crate::integrations::ProviderError;

/// Failures surfaced by contact operations and mapped onto HTTP responses
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Contact not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("Enrichment provider timed out after {}ms", .0.as_millis())]
    ProviderTimeout(Duration),

    #[error("Enrichment provider failed: {0}")]
    ProviderError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ContactError {
    pub fn code(&self) -> &'static str {
        match self {
            ContactError::Unauthenticated => "UNAUTHENTICATED",
            ContactError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            ContactError::NotFound => "NOT_FOUND",
            ContactError::Conflict(_) => "CONFLICT",
            ContactError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ContactError::ProviderTimeout(_) => "PROVIDER_TIMEOUT",
            ContactError::ProviderError(_) => "PROVIDER_ERROR",
            ContactError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl From<StoreError> for ContactError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(email) => {
                ContactError::Conflict(format!("Contact with email {email} already exists"))
            }
            StoreError::Unavailable(msg) => ContactError::StoreUnavailable(msg),
        }
    }
}

impl From<ProviderError> for ContactError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout(after) => ContactError::ProviderTimeout(after),
            other => ContactError::ProviderError(other.to_string()),
        }
    }
}

impl From<ImportError> for ContactError {
    fn from(e: ImportError) -> Self {
        ContactError::InvalidInput(e.to_string())
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ContactError::InvalidIdentifier(_) | ContactError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ContactError::NotFound => StatusCode::NOT_FOUND,
            ContactError::Conflict(_) => StatusCode::CONFLICT,
            ContactError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ContactError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ContactError::ProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        })
    }
}

pub type ContactResult<T> = Result<T, ContactError>;
