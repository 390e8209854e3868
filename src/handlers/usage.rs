//! Usage statistics handler.

use crate::services::{TokenStore, require_admin};
use actix_web::{Error, HttpRequest, HttpResponse, Result, web};
use paperclip::actix::api_v2_operation;

/// Aggregated usage statistics (admin only)
#[api_v2_operation(
    summary = "Usage Statistics",
    description = "Totals of logged API calls by endpoint, by UTC day, and for the ten most active tokens.",
    tags("Authentication"),
    responses(
        (status = 200, description = "Usage statistics"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn usage_stats(req: HttpRequest, store: web::Data<TokenStore>) -> Result<HttpResponse, Error> {
    require_admin(&req, &store)?;
    Ok(HttpResponse::Ok().json(store.usage_stats()))
}
