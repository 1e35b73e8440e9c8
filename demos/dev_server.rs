//! Local server answering every response contract the client understands.
//!
//! Run with: cargo run --example dev_server
//!
//! Then point the device (or `host_client`) at one of:
//!   http://localhost:8000/display   - rotates through all responses below
//!   http://localhost:8000/message   - {"message": "..."}
//!   http://localhost:8000/image     - {"image": {"content_type": "image/png", "data": "..."}}
//!   http://localhost:8000/png       - raw image/png body
//!   http://localhost:8000/fail      - 503
//!
//! Set `DEV_TOKEN` to require `Authorization: Bearer <token>`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pollpanel::ServerPayload;

#[derive(Clone, Default)]
struct AppState {
    hits: Arc<AtomicUsize>,
    token: Option<String>,
}

impl AppState {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        let expected = format!("Bearer {}", token);
        match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

/// 64x32 checkerboard of 8 pixel squares, 1-bit greyscale.
fn checkerboard_png() -> Vec<u8> {
    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 32;

    let mut data = Vec::with_capacity((WIDTH / 8 * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for byte in 0..WIDTH / 8 {
            let light = (byte + y / 8) % 2 == 0;
            data.push(if light { 0xFF } else { 0x00 });
        }
    }

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, WIDTH, HEIGHT);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::One);
    match encoder.write_header() {
        Ok(mut writer) => {
            if let Err(err) = writer.write_image_data(&data) {
                eprintln!("failed to encode image: {}", err);
            }
        }
        Err(err) => eprintln!("failed to encode image: {}", err),
    }
    out
}

fn message() -> Response {
    let epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Json(ServerPayload::message(format!(
        "Hello from dev_server\nepoch {}\nThis line is long enough to wrap on a small panel.",
        epoch
    )))
    .into_response()
}

fn image() -> Response {
    Json(ServerPayload::png(STANDARD.encode(checkerboard_png()))).into_response()
}

fn raw_png() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], checkerboard_png()).into_response()
}

fn fail() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response()
}

async fn display(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let hit = state.hits.fetch_add(1, Ordering::Relaxed);
    println!("GET /display #{}", hit);
    match hit % 4 {
        0 => message(),
        1 => image(),
        2 => raw_png(),
        _ => fail(),
    }
}

async fn fixed(
    State(state): State<AppState>,
    headers: HeaderMap,
    respond: fn() -> Response,
) -> Response {
    match state.authorize(&headers) {
        Ok(()) => respond(),
        Err(status) => status.into_response(),
    }
}

#[tokio::main]
async fn main() {
    let state = AppState {
        hits: Arc::default(),
        token: std::env::var("DEV_TOKEN").ok(),
    };

    println!("Starting pollpanel dev server on http://localhost:8000");
    println!();
    println!("Endpoints:");
    println!("  GET /display - rotate through all responses");
    println!("  GET /message - JSON message");
    println!("  GET /image   - JSON base64 PNG");
    println!("  GET /png     - raw PNG");
    println!("  GET /fail    - 503");
    if state.token.is_some() {
        println!();
        println!("Requests must send 'Authorization: Bearer $DEV_TOKEN'");
    }

    let app = Router::new()
        .route("/display", get(display))
        .route(
            "/message",
            get(|s: State<AppState>, h: HeaderMap| fixed(s, h, message)),
        )
        .route("/image", get(|s: State<AppState>, h: HeaderMap| fixed(s, h, image)))
        .route("/png", get(|s: State<AppState>, h: HeaderMap| fixed(s, h, raw_png)))
        .route("/fail", get(|s: State<AppState>, h: HeaderMap| fixed(s, h, fail)))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
