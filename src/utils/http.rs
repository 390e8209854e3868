//! HTTP utility functions for extracting request information.

use crate::middleware::RequestId;
use actix_web::{HttpMessage, HttpRequest};

/// Extract client IP address from request headers
///
/// Attempts to extract the real client IP from various proxy headers,
/// falling back to the connection remote address.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    let ip_headers = [
        "X-Forwarded-For",
        "X-Real-IP",
        "CF-Connecting-IP", // Cloudflare
        "X-Cluster-Client-IP",
    ];

    for header_name in &ip_headers {
        if let Some(ip) = req
            .headers()
            .get(*header_name)
            .and_then(|h| h.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return ip.to_string();
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Request ID assigned by [`crate::middleware::RequestIdMiddleware`], if it ran
pub fn extract_request_id(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<RequestId>().map(|id| id.0.clone())
}
