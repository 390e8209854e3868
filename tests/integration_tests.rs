mod common;

use actix_web::{http::StatusCode, test};
use common::{ADMIN_TOKEN, bearer, seeded_context};
use image_moderation_api::{MetricsConfig, REQUEST_ID_HEADER, create_app};

#[actix_web::test]
async fn test_health_endpoint_integration() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json, serde_json::json!({ "status": "healthy" }));
}

#[actix_web::test]
async fn test_root_banner_without_credentials() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Image Moderation API");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn test_root_validates_presented_token() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(bearer(ADMIN_TOKEN))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(bearer("not-a-real-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("www-authenticate").unwrap(), "Bearer");

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_security_headers_present() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    let headers = resp.headers();

    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.contains_key("x-frame-options"));
    assert!(headers.contains_key("referrer-policy"));
    assert!(headers.contains_key("content-security-policy"));
}

#[actix_web::test]
async fn test_request_id_is_echoed() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((REQUEST_ID_HEADER, "trace-me-42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-me-42");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
}

#[actix_web::test]
async fn test_metrics_endpoint_reports_requests() {
    let app = test::init_service(create_app(seeded_context())).await;

    for _ in 0..2 {
        let req = test::TestRequest::get().uri("/health").to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("route=\"/health\""));
    assert!(text.contains("app_uptime_seconds"));
    assert!(!text.contains("route=\"/metrics\""));
}

#[actix_web::test]
async fn test_metrics_endpoint_disabled() {
    let context = seeded_context().with_metrics_config(MetricsConfig { enabled: false });
    let app = test::init_service(create_app(context)).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_openapi_spec_lists_routes() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get().uri("/api/spec/v2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let document: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(document["info"]["title"], "Image Moderation API");

    let paths = document["paths"].as_object().unwrap();
    for path in ["/", "/health", "/moderate", "/auth/tokens", "/auth/tokens/{token}", "/auth/usage"] {
        assert!(paths.contains_key(path), "missing path {path}");
    }
}

#[actix_web::test]
async fn test_unknown_route_is_404() {
    let app = test::init_service(create_app(seeded_context())).await;

    let req = test::TestRequest::get().uri("/does-not-exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
