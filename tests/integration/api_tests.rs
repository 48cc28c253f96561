//! API integration tests for IIIF info and image requests.
//!
//! Tests verify:
//! - Region and size resolution reaching the backend as a render query
//! - Grammar rejections happening before any backend call
//! - Error bodies, status codes and headers
//! - Panic recovery

use axum::http::StatusCode;

use iiif_imagex::gateway::IiifSettings;
use iiif_imagex::iiif::{OutputSize, PixelRegion, Quality, IIIF_CONTEXT, PROFILE_LINK_HEADER};

use super::test_utils::{
    get_uri, router_for, router_with_settings, standard_backend, MockBackend, FAKE_JPEG,
};

fn error_body(param: &str, message: &str) -> String {
    format!(
        "An error occurred when processing the '{}' parameter: {}",
        param, message
    )
}

// =============================================================================
// Image Requests
// =============================================================================

#[tokio::test]
async fn test_full_image() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/full/0/native.jpg").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/jpeg"));
    assert_eq!(response.header("cache-control"), Some("public, max-age=3600"));
    assert_eq!(response.header("link"), Some(PROFILE_LINK_HEADER));
    assert_eq!(response.body.as_ref(), FAKE_JPEG);

    let query = backend.last_render();
    assert_eq!(query.identifier, "abc");
    assert_eq!(
        query.region,
        PixelRegion {
            x: 0,
            y: 0,
            width: 1000,
            height: 800
        }
    );
    assert_eq!(query.bottom_right(), (1000, 800));
    assert_eq!(
        query.size,
        OutputSize {
            width: 1000,
            height: 800
        }
    );
}

#[tokio::test]
async fn test_percent_region() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/pct:0,0,50,50/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);

    let query = backend.last_render();
    assert_eq!(query.top_left(), (0, 0));
    assert_eq!(query.bottom_right(), (500, 400));
}

#[tokio::test]
async fn test_pixel_region_is_clamped() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/900,700,500,500/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);

    let query = backend.last_render();
    assert_eq!(
        query.region,
        PixelRegion {
            x: 900,
            y: 700,
            width: 100,
            height: 100
        }
    );
}

#[tokio::test]
async fn test_size_forms() {
    let cases = [
        ("200,", (200, 160)),
        (",400", (500, 400)),
        ("pct:25", (250, 200)),
        ("!500,500", (500, 400)),
        ("300,300", (300, 300)),
    ];

    for (size, expected) in cases {
        let backend = standard_backend();
        let router = router_for(backend.clone());

        let uri = format!("/iiif/abc/full/{}/0/native.jpg", size);
        let response = get_uri(router, &uri).await;
        assert_eq!(response.status, StatusCode::OK, "size {}", size);

        let query = backend.last_render();
        assert_eq!(
            (query.size.width, query.size.height),
            expected,
            "size {}",
            size
        );
    }
}

#[tokio::test]
async fn test_identifier_with_slashes() {
    let backend = MockBackend::new().with_image("maps/sheet-4", 400, 300);
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/maps/sheet-4/full/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.last_render().identifier, "maps/sheet-4");
}

#[tokio::test]
async fn test_color_quality_rendered_as_native() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/full/0/color.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.last_render().quality, Quality::Native);
}

#[tokio::test]
async fn test_requested_format_is_always_jpeg() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    for format in ["png", "tif", "gif"] {
        let uri = format!("/iiif/abc/full/full/0/native.{}", format);
        let response = get_uri(router.clone(), &uri).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("image/jpeg"));
    }
}

#[tokio::test]
async fn test_missing_extension_defaults_to_jpg() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/full/0/native").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.render_count(), 1);
}

#[tokio::test]
async fn test_rotation_accepted_and_not_forwarded() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router.clone(), "/iiif/abc/full/full/360/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);

    let response = get_uri(router, "/iiif/abc/full/full/90.5/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.render_count(), 2);
}

#[tokio::test]
async fn test_rotation_in_exponent_notation() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router.clone(), "/iiif/abc/full/full/1e2/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.render_count(), 1);

    for uri in [
        "/iiif/abc/full/full/inf/native.jpg",
        "/iiif/abc/full/full/NaN/native.jpg",
    ] {
        let response = get_uri(router.clone(), uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(response.text().contains("'rotation' parameter"), "{}", uri);
    }
    assert_eq!(backend.describe_count(), 1);
}

// =============================================================================
// Info Requests
// =============================================================================

#[tokio::test]
async fn test_info_document() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/info.json").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("link"), Some(PROFILE_LINK_HEADER));

    let json = response.json();
    assert_eq!(json["@id"], "http://appserver/iiif/abc");
    assert_eq!(json["@context"], IIIF_CONTEXT);
    assert_eq!(json["width"], 1000);
    assert_eq!(json["height"], 800);
    assert_eq!(json["tile_width"], 256);
    assert_eq!(json["tile_height"], 256);
    assert_eq!(json["scale_factors"], serde_json::json!([1, 2, 4, 8]));
    assert_eq!(json["formats"], serde_json::json!(["jpg", "png"]));
    assert_eq!(json["qualities"], serde_json::json!(["native", "color"]));
    assert!(json["profile"].as_str().unwrap().ends_with("#level1"));

    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_info_document_keys_sorted() {
    let router = router_for(standard_backend());
    let response = get_uri(router, "/iiif/abc/info.json").await;
    let text = response.text();

    let at_context = text.find("\"@context\"").unwrap();
    let at_id = text.find("\"@id\"").unwrap();
    let formats = text.find("\"formats\"").unwrap();
    let width = text.find("\"width\"").unwrap();
    assert!(at_context < at_id && at_id < formats && formats < width);
}

#[tokio::test]
async fn test_custom_settings() {
    let settings = IiifSettings {
        base_url: "https://images.example.org".to_string(),
        prefix: "/image-service".to_string(),
        tile_size: 512,
        scale_factors: vec![1, 2],
        max_image_size: 10000,
    };
    let router = router_with_settings(standard_backend(), settings);

    let response = get_uri(router.clone(), "/image-service/abc/info.json").await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["@id"], "https://images.example.org/image-service/abc");
    assert_eq!(json["tile_width"], 512);
    assert_eq!(json["scale_factors"], serde_json::json!([1, 2]));

    let response = get_uri(router, "/iiif/abc/info.json").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_info_xml_rejected() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/info.xml").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'quality'"));
    assert_eq!(backend.describe_count(), 0);
}

// =============================================================================
// Grammar Errors
// =============================================================================

#[tokio::test]
async fn test_identifier_with_hash_rejected_before_backend() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/a%23b/full/full/0/native.jpg").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert!(response
        .text()
        .starts_with("An error occurred when processing the 'identifier' parameter"));
    assert!(response.header("link").is_none());
    assert_eq!(backend.describe_count(), 0);
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_undecodable_identifier() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/a%FFb/info.json").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(
        response.text(),
        error_body("identifier", "Identifier invalid: 'a%FFb/info.json'")
    );
    assert_eq!(backend.describe_count(), 0);
}

#[tokio::test]
async fn test_bare_prefix() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    for uri in ["/iiif", "/iiif/"] {
        let response = get_uri(router.clone(), uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            response.text(),
            error_body("quality", "Quality unspecified"),
            "{}",
            uri
        );
    }
    assert_eq!(backend.describe_count(), 0);
}

#[tokio::test]
async fn test_bare_root_with_empty_prefix() {
    let backend = standard_backend();
    let settings = IiifSettings {
        prefix: String::new(),
        ..IiifSettings::default()
    };
    let router = router_with_settings(backend.clone(), settings);

    let response = get_uri(router.clone(), "/").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), error_body("quality", "Quality unspecified"));

    let response = get_uri(router.clone(), "/abc/info.json").await;
    assert_eq!(response.status, StatusCode::OK);

    let response = get_uri(router, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.describe_count(), 1);
}

#[tokio::test]
async fn test_missing_rotation() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/native.jpg").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text(),
        error_body("rotation", "Rotation unspecified")
    );
    assert_eq!(backend.describe_count(), 0);
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_missing_segments_named_right_to_left() {
    let cases = [
        ("/iiif/0/native.jpg", "size", "Size unspecified"),
        ("/iiif/full/0/native.jpg", "region", "Region unspecified"),
        (
            "/iiif/full/full/0/native.jpg",
            "identifier",
            "Identifier unspecified",
        ),
    ];

    for (uri, param, message) in cases {
        let backend = standard_backend();
        let response = get_uri(router_for(backend.clone()), uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(response.text(), error_body(param, message), "{}", uri);
        assert_eq!(backend.describe_count(), 0);
    }
}

#[tokio::test]
async fn test_invalid_segments() {
    let cases = [
        ("/iiif/abc/everything/full/0/native.jpg", "region"),
        ("/iiif/abc/full/huge/0/native.jpg", "size"),
        ("/iiif/abc/full/full/left/native.jpg", "rotation"),
        ("/iiif/abc/full/full/0/sepia.jpg", "quality"),
        ("/iiif/abc/full/full/0/native.webp", "format"),
    ];

    for (uri, param) in cases {
        let backend = standard_backend();
        let response = get_uri(router_for(backend.clone()), uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(
            response.text().contains(&format!("'{}' parameter", param)),
            "{}: {}",
            uri,
            response.text()
        );
        assert_eq!(backend.describe_count(), 0, "{}", uri);
    }
}

// =============================================================================
// Geometry and Capability Errors
// =============================================================================

#[tokio::test]
async fn test_region_out_of_bounds() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/1000,0,10,10/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'region' parameter"));
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_region_origin_beyond_u32() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/4294967296,0,10,10/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'region' parameter"));
    assert!(response.text().contains("(4294967296 >= 1000)"));
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_zero_size() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/0,/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'size' parameter"));
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_rotation_out_of_range() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/full/361/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'rotation' parameter"));
    assert_eq!(backend.render_count(), 0);
}

#[tokio::test]
async fn test_size_above_limit() {
    let settings = IiifSettings {
        max_image_size: 600,
        ..IiifSettings::default()
    };
    let backend = standard_backend();
    let router = router_with_settings(backend.clone(), settings);

    let response = get_uri(router.clone(), "/iiif/abc/full/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text().contains("'size' parameter"));

    let response = get_uri(router, "/iiif/abc/full/!600,600/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.render_count(), 1);
}

#[tokio::test]
async fn test_unsupported_quality() {
    for quality in ["grey", "bitonal"] {
        let backend = standard_backend();
        let router = router_for(backend.clone());

        let uri = format!("/iiif/abc/full/full/0/{}.jpg", quality);
        let response = get_uri(router, &uri).await;

        assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
        assert!(response.text().contains("'quality' parameter"));
        assert_eq!(backend.render_count(), 0);
    }
}

// =============================================================================
// Backend Failures
// =============================================================================

#[tokio::test]
async fn test_unknown_identifier() {
    let backend = standard_backend();
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/nope/info.json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text(),
        error_body(
            "information request",
            "Problem getting information from the server"
        )
    );
}

#[tokio::test]
async fn test_render_failure() {
    let backend = standard_backend();
    backend.set_render_failure(true);
    let router = router_for(backend.clone());

    let response = get_uri(router, "/iiif/abc/full/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text(),
        error_body("image request", "Problem getting information from the server")
    );
    assert!(!response.text().contains("timed out"));
}

#[tokio::test]
async fn test_panic_becomes_500_and_server_keeps_serving() {
    let backend = standard_backend();
    backend.set_panic_on_render(true);
    let router = router_for(backend.clone());

    let response = get_uri(router.clone(), "/iiif/abc/full/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains("exploded"));

    backend.set_panic_on_render(false);
    let response = get_uri(router, "/iiif/abc/full/full/0/native.jpg").await;
    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// Health Check
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = router_for(MockBackend::new());
    let response = get_uri(router, "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}
