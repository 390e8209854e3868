//! Image moderation handler.

use crate::{
    error::ApiError,
    models::{AuthEventOutcome, AuthEventType, ModerationResult, TokenRecord, UsageMetadata, UsageRecord},
    services::{AppMetrics, AuditContext, ModerationService, SimpleRateLimiter, TokenStore, authenticate},
};
use actix_multipart::{Field, Multipart};
use actix_web::{Error, HttpRequest, Result, web};
use futures_util::TryStreamExt;
use paperclip::actix::api_v2_operation;
use tracing::{error, info};

pub const MODERATE_ENDPOINT: &str = "/moderate";
pub const FILE_FIELD: &str = "file";

/// An image part read from the multipart body
#[derive(Debug)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Analyze an uploaded image for harmful content
#[api_v2_operation(
    summary = "Moderate Image",
    description = "Classifies an uploaded image (multipart field `file`) as safe or unsafe. Undecodable images are reported as `processing_error` results.",
    tags("Moderation"),
    responses(
        (status = 200, description = "Moderation result", body = ModerationResult),
        (status = 400, description = "File must be an image"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Not authenticated"),
        (status = 413, description = "File too large"),
        (status = 422, description = "Missing file field"),
        (status = 429, description = "Too Many Requests"),
        (status = 500, description = "Failed to process image")
    )
)]
pub async fn moderate_image(
    req: HttpRequest,
    store: web::Data<TokenStore>,
    moderation: web::Data<ModerationService>,
    payload: web::Payload,
) -> Result<web::Json<ModerationResult>, Error> {
    let caller = authenticate(&req, &store)?;
    enforce_rate_limit(&req, &caller)?;

    let limit = moderation.config().max_upload_bytes;
    let multipart = Multipart::new(req.headers(), payload);
    let upload = read_image_field(multipart, limit, &moderation.config().max_upload_label()).await?;

    let UploadedImage {
        filename,
        content_type,
        bytes,
    } = upload;
    let size = bytes.len();
    let service = moderation.clone();
    let outcome = web::block(move || service.analyze(&bytes)).await;

    match outcome {
        Ok(result) => {
            if let Some(metrics) = req.app_data::<web::Data<AppMetrics>>() {
                metrics.record_moderation(&result);
            }
            info!(
                token_hint = %caller.hint(),
                file_size = size,
                is_safe = result.is_safe,
                categories = ?result.categories,
                "image moderated"
            );
            let record = success_usage(&caller.token, filename, size, content_type, &result);
            log_usage(store, record).await;
            Ok(web::Json(result))
        }
        Err(e) => {
            error!(token_hint = %caller.hint(), error = %e, "moderation job failed");
            log_usage(store, failure_usage(&caller.token, filename, &e.to_string())).await;
            Err(ApiError::Processing.into())
        }
    }
}

fn enforce_rate_limit(req: &HttpRequest, caller: &TokenRecord) -> Result<(), ApiError> {
    let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() else {
        return Ok(());
    };
    if limiter.check_rate_limit(&caller.token) {
        return Ok(());
    }

    AuditContext::from_request(req)
        .event(AuthEventType::RateLimitExceeded, AuthEventOutcome::Failure)
        .with_token_hint(Some(caller.hint()))
        .log();
    Err(ApiError::RateLimited)
}

fn success_usage(
    token: &str,
    filename: Option<String>,
    size: usize,
    content_type: String,
    result: &ModerationResult,
) -> UsageRecord {
    UsageRecord::new(token, MODERATE_ENDPOINT, "POST", 200).with_metadata(UsageMetadata {
        filename,
        file_size: Some(size),
        content_type: Some(content_type),
        is_safe: Some(result.is_safe),
        error: None,
    })
}

fn failure_usage(token: &str, filename: Option<String>, error: &str) -> UsageRecord {
    UsageRecord::new(token, MODERATE_ENDPOINT, "POST", 500).with_metadata(UsageMetadata {
        filename,
        error: Some(error.to_string()),
        ..UsageMetadata::default()
    })
}

/// Store writes touch the disk, so they run on the blocking pool. A failed
/// usage write must not discard a finished moderation result.
async fn log_usage(store: web::Data<TokenStore>, record: UsageRecord) {
    match web::block(move || store.log_usage(record)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "failed to record usage"),
        Err(e) => error!(error = %e, "usage write job failed"),
    }
}

/// Pull the `file` part out of a multipart body.
///
/// The content type is checked before any bytes are buffered, and reading
/// stops as soon as `limit` is exceeded. Other parts are skipped.
pub async fn read_image_field(
    mut multipart: Multipart,
    limit: usize,
    limit_label: &str,
) -> Result<UploadedImage, ApiError> {
    while let Some(field) = multipart.try_next().await.map_err(invalid_multipart)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .filter(|ct| ct.starts_with("image/"))
            .ok_or(ApiError::NotAnImage)?;
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let bytes = read_limited(field, limit, limit_label).await?;
        return Ok(UploadedImage {
            filename,
            content_type,
            bytes,
        });
    }
    Err(ApiError::MissingField(FILE_FIELD))
}

async fn read_limited(mut field: Field, limit: usize, limit_label: &str) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(invalid_multipart)? {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge {
                limit: limit_label.to_string(),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn invalid_multipart(e: actix_multipart::MultipartError) -> ApiError {
    ApiError::InvalidMultipart(e.to_string())
}
