use std::path::Path;

use fampho_core::{AppError, ErrorMetadata};
use serde_json::json;

/// Guess an upload's content type from its file extension.
///
/// Unknown extensions map to `application/octet-stream`, which the upload
/// validator then rejects with a per-file error.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// JSON body printed when a command fails with an archive error.
///
/// Sensitive errors (database, storage, internal) carry no `detail`.
pub fn error_body(err: &AppError) -> serde_json::Value {
    let detail = (!err.is_sensitive()).then(|| err.to_string());
    json!({
        "error": {
            "code": err.error_code(),
            "status": err.http_status_code(),
            "message": err.client_message(),
            "detail": detail,
            "recoverable": err.is_recoverable(),
            "suggested_action": err.suggested_action(),
        }
    })
}

/// Initialize tracing for the CLI.
///
/// `RUST_LOG` controls the filter (default `fampho=info`); `LOG_FORMAT=json`
/// switches to structured JSON lines on stderr.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fampho=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
