//! HTML form method override
//!
//! Browsers only submit GET and POST, so edit and delete forms post to
//! `...?_method=PUT` or `...?_method=DELETE`. The rewrite has to run
//! before routing, so it wraps the whole router rather than being a
//! route layer.

use axum::extract::Request;
use axum::http::Method;

const OVERRIDE_PARAM: &str = "_method";

/// Rewrite `POST ?_method=PUT|PATCH|DELETE` to that method
pub fn override_method(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }

    let Some(query) = request.uri().query() else {
        return request;
    };

    let requested = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == OVERRIDE_PARAM)
        .and_then(|(_, value)| match value.to_ascii_uppercase().as_str() {
            "PUT" => Some(Method::PUT),
            "PATCH" => Some(Method::PATCH),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        });

    if let Some(method) = requested {
        tracing::debug!(uri = %request.uri(), %method, "Overriding form method");
        *request.method_mut() = method;
    }

    request
}
