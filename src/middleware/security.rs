//! Security headers middleware implementation.

use crate::config::SecurityHeadersConfig;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderMap, HeaderName, HeaderValue},
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
};

/// Security headers middleware factory
pub struct SecurityHeaders {
    config: Rc<SecurityHeadersConfig>,
}

impl SecurityHeaders {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service,
            config: Rc::clone(&self.config),
        }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: S,
    config: Rc<SecurityHeadersConfig>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);
        let config = Rc::clone(&self.config);

        Box::pin(async move {
            let mut res = fut.await?;
            apply_security_headers(&config, res.headers_mut());
            Ok(res)
        })
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// Write the configured security headers, replacing any set by handlers
pub fn apply_security_headers(config: &SecurityHeadersConfig, headers: &mut HeaderMap) {
    if config.content_type_options {
        insert(headers, "x-content-type-options", "nosniff");
    }
    insert(headers, "x-frame-options", &config.frame_options);
    if config.xss_protection {
        insert(headers, "x-xss-protection", "1; mode=block");
    }
    insert(headers, "referrer-policy", &config.referrer_policy);
    if config.csp_enabled {
        insert(headers, "content-security-policy", &config.csp_directives);
    }
    if config.hsts_enabled {
        insert(
            headers,
            "strict-transport-security",
            &format!("max-age={}", config.hsts_max_age),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&SecurityHeadersConfig::default(), &mut headers);

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-xss-protection").unwrap(), "1; mode=block");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(
            headers.get("strict-transport-security").unwrap(),
            "max-age=31536000"
        );
        assert!(headers.contains_key("content-security-policy"));
    }

    #[test]
    fn test_disabled_headers_are_skipped() {
        let config = SecurityHeadersConfig {
            csp_enabled: false,
            hsts_enabled: false,
            content_type_options: false,
            xss_protection: false,
            ..SecurityHeadersConfig::default()
        };
        let mut headers = HeaderMap::new();
        apply_security_headers(&config, &mut headers);

        assert!(!headers.contains_key("content-security-policy"));
        assert!(!headers.contains_key("strict-transport-security"));
        assert!(!headers.contains_key("x-content-type-options"));
        assert!(!headers.contains_key("x-xss-protection"));
        assert!(headers.contains_key("x-frame-options"));
    }
}
