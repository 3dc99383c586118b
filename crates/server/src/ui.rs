use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "ui"]
struct UiAssets;

/// Serve the embedded operator page
pub async fn serve_ui() -> Response {
    match UiAssets::get("index.html") {
        Some(content) => serve_file("index.html", content.data.as_ref()),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn serve_file(path: &str, content: &[u8]) -> Response {
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime_type.as_ref())],
        content.to_vec(),
    )
        .into_response()
}
