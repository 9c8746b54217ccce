//! Request identification.
//!
//! Every request gets an `x-request-id` as early as possible so log lines
//! for the inbound request, the forwarding call and the response can be
//! correlated. A caller-supplied id is kept; otherwise a UUID v4 is minted.
//!
//! The id lives in request extensions only. The caller's header map is left
//! alone because it is copied verbatim onto the upstream request.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Attach a [`RequestId`] extension and echo it on the response.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let id = match request.headers().get(&X_REQUEST_ID) {
        Some(value) => Some(RequestId::new(value.clone())),
        None => MakeRequestUuidV4.make_request_id(&request),
    };
    if let Some(id) = &id {
        request.extensions_mut().insert(id.clone());
    }

    let mut response = next.run(request).await;
    if let Some(id) = id {
        if !response.headers().contains_key(&X_REQUEST_ID) {
            response.headers_mut().insert(X_REQUEST_ID, id.into_header_value());
        }
    }
    response
}

/// Request id of a request that already passed [`request_id`], or `"unknown"`.
pub fn request_id_of<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_uuid_ids() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = MakeRequestUuidV4.make_request_id(&req).unwrap();
        let parsed = Uuid::parse_str(id.header_value().to_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_request_id_of() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(RequestId::new(HeaderValue::from_static("abc-123")));
        assert_eq!(request_id_of(&req), "abc-123");

        let header_only = Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id_of(&header_only), "unknown");
    }
}
