//! HTTP layer: one logical route (any path, GET or POST) that renders a
//! logo per request.
//!
//! Query parameters win over body fields; bodies may be multipart form data
//! (with an optional `bgImage` file part), urlencoded forms, or JSON with
//! scalar values. Successful `type=image` requests return raw PNG bytes;
//! everything else is a `{code, message, data}` envelope whose code the
//! HTTP status mirrors.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use balogo_rs::{render, Assets, LogoError, OutputType, ParamMap, RenderDefaults, RenderParams};

/// Read-only state shared by every request.
pub struct AppState {
    pub assets: Arc<Assets>,
    pub defaults: RenderDefaults,
}

/// JSON response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ImagePayload>,
}

#[derive(Debug, Serialize)]
pub struct ImagePayload {
    pub image: String,
}

/// Build the application router: a single fallback handler so every path
/// hits the renderer, plus request tracing and permissive CORS.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn envelope_response(code: u16, message: impl Into<String>, data: Option<ImagePayload>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(Envelope {
            code,
            message: message.into(),
            data,
        }),
    )
        .into_response()
}

fn error_response(err: &LogoError) -> Response {
    if err.is_client_error() {
        envelope_response(409, err.to_string(), None)
    } else {
        tracing::error!("render failed: {err}");
        envelope_response(500, err.to_string(), None)
    }
}

/// Body fields plus the optional background image upload.
type BodyFields = (ParamMap, Option<Arc<Vec<u8>>>);

async fn read_multipart(req: Request) -> Result<BodyFields, Response> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|err| envelope_response(400, format!("malformed multipart body: {err}"), None))?;

    let mut fields = ParamMap::new();
    let mut bg_image = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(envelope_response(
                    400,
                    format!("malformed multipart body: {err}"),
                    None,
                ))
            }
        };
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "bgImage" {
            let bytes = field.bytes().await.map_err(|err| {
                envelope_response(400, format!("unreadable bgImage upload: {err}"), None)
            })?;
            bg_image = Some(Arc::new(bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(|err| {
                envelope_response(400, format!("unreadable field {name}: {err}"), None)
            })?;
            fields.insert(name, value);
        }
    }

    Ok((fields, bg_image))
}

async fn read_body(req: Request) -> Result<BodyFields, Response> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        return read_multipart(req).await;
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<ParamMap>::from_request(req, &()).await.map_err(|err| {
            envelope_response(400, format!("malformed form body: {err}"), None)
        })?;
        return Ok((fields, None));
    }

    if content_type.starts_with("application/json") {
        let Json(value) = Json::<serde_json::Value>::from_request(req, &())
            .await
            .map_err(|err| envelope_response(400, format!("malformed JSON body: {err}"), None))?;
        let mut fields = ParamMap::new();
        if let serde_json::Value::Object(object) = value {
            for (key, value) in object {
                // Scalars only; nested structures have no recognized meaning
                match value {
                    serde_json::Value::String(s) => {
                        fields.insert(key, s);
                    }
                    serde_json::Value::Number(n) => {
                        fields.insert(key, n.to_string());
                    }
                    serde_json::Value::Bool(b) => {
                        fields.insert(key, b.to_string());
                    }
                    _ => {}
                }
            }
        }
        return Ok((fields, None));
    }

    Ok((ParamMap::new(), None))
}

async fn handle(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let query = match Query::<ParamMap>::try_from_uri(req.uri()) {
        Ok(Query(query)) => query,
        Err(err) => return envelope_response(400, format!("malformed query string: {err}"), None),
    };

    let (body, bg_image) = match read_body(req).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let params = match RenderParams::resolve(&state.defaults, &query, &body, bg_image) {
        Ok(params) => params,
        Err(err) => return error_response(&err),
    };

    let output = params.output;
    let encoding = params.encoding;

    // Rendering is pure CPU work; keep it off the async runtime.
    let assets = Arc::clone(&state.assets);
    let rendered = tokio::task::spawn_blocking(move || render(&params, &assets)).await;

    let png = match rendered {
        Ok(Ok(png)) => png,
        Ok(Err(err)) => return error_response(&err),
        Err(err) => {
            tracing::error!("render task failed: {err}");
            return envelope_response(500, "render task failed", None);
        }
    };

    match output {
        OutputType::Image => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/png")],
            png,
        )
            .into_response(),
        OutputType::Json => envelope_response(
            200,
            "ok",
            Some(ImagePayload {
                image: encoding.encode(&png),
            }),
        ),
    }
}
