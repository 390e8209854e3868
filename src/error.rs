//! Error types for the storage layer and HTTP surface.

use actix_web::{
    HttpResponse, ResponseError,
    http::{StatusCode, header},
};
use serde::Serialize;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures of the token/usage store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("corrupt store snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize store snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not generate a unique token after {0} attempts")]
    TokenSpaceExhausted(usize),
}

/// Reasons an uploaded image cannot be analyzed
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image is {width}x{height} ({pixels} pixels), limit is {limit} pixels")]
    TooManyPixels {
        width: u32,
        height: u32,
        pixels: u64,
        limit: u64,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Failures while assembling application state at startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token store: {0}")]
    Store(#[from] StoreError),

    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl From<StartupError> for io::Error {
    fn from(err: StartupError) -> Self {
        io::Error::other(err)
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Token not found")]
    TokenNotFound,

    #[error("File must be an image")]
    NotAnImage,

    #[error("File too large. Maximum size is {limit}")]
    PayloadTooLarge { limit: String },

    #[error("Missing required form field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Malformed multipart body: {0}")]
    InvalidMultipart(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Failed to process image")]
    Processing,

    #[error("Storage failure")]
    Storage(#[from] StoreError),
}

/// JSON body for every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredentials | ApiError::AdminRequired => StatusCode::FORBIDDEN,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::TokenNotFound => StatusCode::NOT_FOUND,
            ApiError::NotAnImage | ApiError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MissingField(_) | ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Processing | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let ApiError::Storage(source) = self {
            tracing::error!(error = %source, "store operation failed");
        }

        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: self.to_string(),
        };

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_invalid_token_response() {
        let resp = ApiError::InvalidToken.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unauthorized");
        assert_eq!(json["detail"], "Invalid or expired token");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MissingCredentials.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::AdminRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::TokenNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::PayloadTooLarge {
                limit: "10MB".to_string()
            }
            .to_string(),
            "File too large. Maximum size is 10MB"
        );
        assert_eq!(
            ApiError::MissingField("file").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidBody("expected value".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Storage(StoreError::TokenSpaceExhausted(5)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
