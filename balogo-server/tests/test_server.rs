//! Router-level tests driven through tower's oneshot, no sockets needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use balogo_rs::{AssetConfig, Assets, RenderDefaults};
use balogo_server::{build_router, AppState};

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4e, 0x47];

fn test_app() -> Router {
    // No system font scan: keeps the suite fast and environment-independent
    let assets = Assets::load(&AssetConfig {
        load_system_fonts: false,
        ..AssetConfig::default()
    })
    .unwrap();
    build_router(Arc::new(AppState {
        assets: Arc::new(assets),
        defaults: RenderDefaults::default(),
    }))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn image_request_returns_png() {
    let response = test_app()
        .oneshot(Request::get("/?textL=Hello").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..4], PNG_MAGIC);
}

#[tokio::test]
async fn any_path_is_routed() {
    let response = test_app()
        .oneshot(
            Request::get("/some/deep/path?textR=Anywhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn json_request_wraps_encoded_image() {
    let response = test_app()
        .oneshot(
            Request::get("/?type=json&encode=hex")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["code"], 200);
    let image = body["data"]["image"].as_str().unwrap();
    let decoded = hex::decode(image).unwrap();
    assert_eq!(&decoded[..4], PNG_MAGIC);
}

#[tokio::test]
async fn hex_json_matches_image_bytes() {
    let app = test_app();

    let image_response = app
        .clone()
        .oneshot(Request::get("/?textL=Same").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let image = body_bytes(image_response).await;

    let json_response = app
        .oneshot(
            Request::get("/?textL=Same&type=json&encode=hex")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(json_response).await).unwrap();
    let decoded = hex::decode(body["data"]["image"].as_str().unwrap()).unwrap();

    assert_eq!(decoded, image);
}

#[tokio::test]
async fn invalid_type_is_client_error() {
    let response = test_app()
        .oneshot(Request::get("/?type=xml").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["code"], 409);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn invalid_subtitle_align_is_client_error() {
    let response = test_app()
        .oneshot(
            Request::get("/?subtitleAlign=diagonal")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn form_body_fields_are_merged() {
    let response = test_app()
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("textL=Form&textR=Body"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
}

#[tokio::test]
async fn query_overrides_body() {
    // Body asks for an invalid type, query pins a valid one: query wins
    let response = test_app()
        .oneshot(
            Request::post("/?type=image")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("type=xml"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn json_body_scalars_are_accepted() {
    let response = test_app()
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"textL":"Json","fontSize":48,"transparent":true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let response = test_app()
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn multipart_fields_and_bg_image_are_read() {
    // Minimal 1x1 PNG for the file part
    let mut png = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png, 1, 1);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[10, 20, 30, 255]).unwrap();
    }

    let boundary = "balogo-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"textL\"\r\n\r\nUpload\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"bgImage\"; filename=\"bg.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&png);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = test_app()
        .oneshot(
            Request::post("/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..4], PNG_MAGIC);
}

#[tokio::test]
async fn unreadable_bg_image_is_render_error() {
    let boundary = "balogo-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"bgImage\"; filename=\"bg.bin\"\r\nContent-Type: application/octet-stream\r\n\r\nnot-an-image\r\n--{boundary}--\r\n"
    );

    let response = test_app()
        .oneshot(
            Request::post("/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["code"], 500);
}
