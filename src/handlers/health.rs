//! Service info and health check handlers.

use crate::{
    models::{HealthResponse, ServiceInfo},
    services::{TokenStore, authenticate},
    utils::has_authorization,
};
use actix_web::{Error, HttpRequest, Result, web};
use paperclip::actix::api_v2_operation;

/// Service banner; doubles as a token check when a bearer is sent
///
/// Anonymous callers get the banner. A caller that sends an `Authorization`
/// header must present a valid token, which makes this the cheapest way for
/// a client to check a token before using it.
#[api_v2_operation(
    summary = "Service Info",
    description = "Returns the service name and version. When an Authorization header is sent, the bearer token is validated.",
    tags("Service"),
    responses(
        (status = 200, description = "Service info", body = ServiceInfo),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Malformed Authorization header")
    )
)]
pub async fn root(
    req: HttpRequest,
    store: web::Data<TokenStore>,
) -> Result<web::Json<ServiceInfo>, Error> {
    if has_authorization(&req) {
        authenticate(&req, &store)?;
    }
    Ok(web::Json(ServiceInfo::current()))
}

/// Health check endpoint
///
/// Used by load balancers and container health checks; never authenticated.
#[api_v2_operation(
    summary = "Health Check Endpoint",
    description = "Returns the current health status of the API in JSON format.",
    tags("Service"),
    responses(
        (status = 200, description = "Successful response", body = HealthResponse)
    )
)]
pub async fn health() -> Result<web::Json<HealthResponse>, Error> {
    Ok(web::Json(HealthResponse {
        status: "healthy".to_string(),
    }))
}
