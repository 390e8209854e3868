//! Route pattern extraction utilities.

use actix_web::HttpRequest;

/// Metric label for a request's route.
///
/// Uses the matched resource pattern (`/auth/tokens/{token}`) so path
/// parameters never become label values. Unmatched requests share one label.
pub fn extract_route_pattern(req: &HttpRequest) -> String {
    req.match_pattern()
        .unwrap_or_else(|| "/unmatched".to_string())
}
