//! API middleware
//!
//! The access guard: every protected call must carry a valid, unexpired
//! bearer token. Rejection happens here, before any handler runs or any
//! store access occurs.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

use super::AppState;

/// Verify the caller's token and stash the resulting `AuthUser` in the
/// request extensions for handlers to pick up.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(&request).or_else(|| query_token(&request));

    let Some(token) = token else {
        return Err(
            AppError::Unauthorized("Missing bearer token".to_string()).into_response(),
        );
    };

    match state.auth.verify_token(&token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(err) => Err(err.into_response()),
    }
}

fn bearer_token(request: &Request<Body>) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    value.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Browser WebSocket clients cannot set an Authorization header; they pass
/// the token on the query string instead.
fn query_token(request: &Request<Body>) -> Option<String> {
    request
        .uri()
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = request("/payments", Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let req = request("/payments", Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&req).is_none());
    }

    #[test]
    fn test_missing_header() {
        let req = request("/payments", None);
        assert!(bearer_token(&req).is_none());
    }

    #[test]
    fn test_query_token_extraction() {
        let req = request("/events?token=abc.def.ghi", None);
        assert_eq!(query_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = request("/events?foo=bar&token=xyz", None);
        assert_eq!(query_token(&req).as_deref(), Some("xyz"));

        let req = request("/events", None);
        assert!(query_token(&req).is_none());
    }
}
