//! Response emission.
//!
//! # Responsibilities
//! - Turn a `ProxyResponse` into an axum `Response`
//! - Stream or send the buffered body according to `ResponseBody`
//! - Drop hop-by-hop headers; framing belongs to the server runtime
//! - Keep a non-canonical upstream reason phrase
//!
//! # Design Decisions
//! - Redirects carry only `Location`; the upstream body and headers are dropped
//! - Everything else in the transformed header set is emitted as-is

use axum::{
    body::Body,
    http::{header, HeaderName, Response},
    response::IntoResponse,
};
use hyper::ext::ReasonPhrase;

use crate::proxy::{Forwarded, HeaderSet, ProxyResponse, Redirect, ResponseBody};

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response<Body> {
        match self {
            ProxyResponse::Forward(forwarded) => forward_response(forwarded),
            ProxyResponse::Redirect(redirect) => redirect_response(redirect),
        }
    }
}

fn forward_response(forwarded: Forwarded) -> Response<Body> {
    let body = match forwarded.body {
        ResponseBody::Stream(stream) => Body::from_stream(stream),
        ResponseBody::Buffered(bytes) => Body::from(bytes),
    };

    let mut response = Response::new(body);
    *response.status_mut() = forwarded.status;
    *response.headers_mut() = end_to_end(forwarded.headers).into_header_map();

    if let Some(reason) = forwarded.reason {
        match ReasonPhrase::try_from(reason) {
            Ok(phrase) => {
                response.extensions_mut().insert(phrase);
            }
            Err(_) => tracing::debug!("Dropping unrepresentable upstream reason phrase"),
        }
    }

    response
}

fn redirect_response(redirect: Redirect) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = redirect.status;
    response
        .headers_mut()
        .insert(header::LOCATION, redirect.location);
    response
}

fn end_to_end(mut headers: HeaderSet) -> HeaderSet {
    let hop: Vec<HeaderName> = headers
        .iter()
        .map(|(name, _)| name)
        .filter(|name| is_hop_by_hop(name))
        .cloned()
        .collect();
    for name in &hop {
        headers.delete(name);
    }
    headers
}
