use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::{to_bytes, Body};
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

static LOG_COUNTER: AtomicU64 = AtomicU64::new(1);

const BODY_READ_LIMIT_BYTES: usize = 1_048_576;
const SHORT_BODY_MAX_CHARS: usize = 160;

pub async fn log_hub_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let route = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |matched_path| matched_path.as_str().to_string(),
    );

    let (parts, body) = request.into_parts();
    let (body_bytes, short_body) = match to_bytes(body, BODY_READ_LIMIT_BYTES).await {
        Ok(bytes) => {
            let shortened = shorten_request_body(&redact_password(&String::from_utf8_lossy(
                &bytes,
            )));
            (bytes, shortened)
        }
        Err(_) => (
            axum::body::Bytes::new(),
            "<request-body-unavailable>".to_string(),
        ),
    };

    let handler = hub_handler_name(method.as_str(), route.as_str());
    let log_number = LOG_COUNTER.fetch_add(1, Ordering::Relaxed);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    tracing::info!(
        seq = log_number,
        handler,
        %method,
        %route,
        status = response.status().as_u16(),
        body = %short_body,
        "request handled"
    );
    response
}

// Credentials posted to auth and identity routes must never reach the log.
fn redact_password(raw_body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(raw_body) else {
        return raw_body.to_string();
    };

    if let Some(object) = value.as_object_mut() {
        if let Some(password) = object.get_mut("password") {
            *password = serde_json::Value::String("***".to_string());
        }
    }

    value.to_string()
}

fn shorten_request_body(raw_body: &str) -> String {
    if raw_body.is_empty() {
        return "-".to_string();
    }

    let single_line = raw_body
        .replace(['\r', '\n', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if single_line.chars().count() <= SHORT_BODY_MAX_CHARS {
        return single_line;
    }

    let mut shortened = single_line
        .chars()
        .take(SHORT_BODY_MAX_CHARS)
        .collect::<String>();
    shortened.push_str("...");
    shortened
}

fn hub_handler_name(method: &str, route: &str) -> &'static str {
    match (method, route) {
        ("POST", "/api/auth/setup") => "auth.auth_setup",
        ("POST", "/api/auth/login") => "auth.auth_login",
        ("POST", "/api/auth/logout") => "auth.auth_logout",
        ("GET", "/api/auth/status") => "auth.auth_status",
        ("GET", "/trackers" | "/trackers/") => "trackers.list_trackers",
        ("POST", "/trackers") => "trackers.create_tracker",
        ("GET", "/trackers/:id") => "trackers.get_tracker",
        ("PUT", "/trackers/:id") => "trackers.update_tracker",
        ("DELETE", "/trackers/:id") => "trackers.delete_tracker",
        ("GET", "/identities") => "identities.list_identities",
        ("POST", "/identities") => "identities.create_identity",
        ("GET", "/identities/:id") => "identities.get_identity",
        ("DELETE", "/identities/:id") => "identities.delete_identity",
        _ => "unknown.unknown_handler",
    }
}
