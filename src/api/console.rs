//! Browser console served from assets embedded in the binary
//!
//! `GET /` returns the console page; `GET /static/*path` returns its script
//! and stylesheet. The page itself is static: it fills the settings form from
//! `GET /config` and follows `GET /stream`, which replays the history first.

use axum::body::Body;
use axum::extract::Path;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use mime_guess::MimeGuess;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "web/"]
struct ConsoleAssets;

/// Embedded path of the console page
pub const INDEX_PAGE: &str = "index.html";

fn content_type_for(path: &str) -> HeaderValue {
    let mime: MimeGuess = mime_guess::from_path(path);
    let value = mime.first_or_octet_stream().to_string();
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

fn asset_response(path: &str) -> Option<Response> {
    ConsoleAssets::get(path).map(|asset| {
        let mut response = Response::new(Body::from(asset.data.into_owned()));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type_for(path));
        response
    })
}

/// GET / - Console page
pub async fn index() -> Response {
    asset_response(INDEX_PAGE).unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

/// GET /static/*path - Console script and stylesheet
pub async fn static_asset(Path(path): Path<String>) -> Response {
    let path = format!("static/{}", path.trim_start_matches('/'));
    match asset_response(&path) {
        Some(response) => response,
        None => {
            tracing::debug!(path = %path, "console asset not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_files_are_embedded() {
        assert!(ConsoleAssets::get(INDEX_PAGE).is_some());
        assert!(ConsoleAssets::get("static/js/main.js").is_some());
        assert!(ConsoleAssets::get("static/css/style.css").is_some());
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("index.html"), "text/html");
        assert_eq!(content_type_for("static/js/main.js"), "text/javascript");
        assert_eq!(content_type_for("static/css/style.css"), "text/css");
    }
}
