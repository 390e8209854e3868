//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use actix_web::test;
use image::{ImageFormat, Rgb, RgbImage};
use image_moderation_api::{AppContext, TokenRecord, TokenStore};
use std::io::Cursor;

pub const ADMIN_TOKEN: &str = "admin-token-12345";
pub const USER_TOKEN: &str = "user-token-67890";
pub const BOUNDARY: &str = "----moderation-test-boundary";

/// Store holding one admin and one regular token
pub fn seeded_store() -> TokenStore {
    let store = TokenStore::in_memory();
    store
        .insert_token(TokenRecord::new(ADMIN_TOKEN, true, Some("admin".to_string())))
        .unwrap();
    store
        .insert_token(TokenRecord::new(USER_TOKEN, false, Some("user".to_string())))
        .unwrap();
    store
}

pub fn seeded_context() -> AppContext {
    AppContext::new(seeded_store()).unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Uniform blue: no skin tones, no edges
pub fn plain_png() -> Vec<u8> {
    png_bytes(&RgbImage::from_pixel(32, 32, Rgb([30, 60, 200])))
}

/// Uniform skin tone
pub fn skin_png() -> Vec<u8> {
    png_bytes(&RgbImage::from_pixel(32, 32, Rgb([220, 170, 140])))
}

/// Dense black/white stripes
pub fn stripes_png() -> Vec<u8> {
    png_bytes(&RgbImage::from_fn(64, 64, |x, _| {
        if (x / 4) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    }))
}

/// Build a multipart/form-data body with a single file part
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST /moderate with the given token and multipart body
pub fn moderate_request(token: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/moderate")
        .insert_header(bearer(token))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}
