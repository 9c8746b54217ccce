//! Redirect interception.
//!
//! When enabled, a response carrying `location` is replaced by a bare
//! redirect to that location so the caller follows it directly instead of
//! through the proxy. This exposes the real upstream location to the caller.

use axum::http::{header, HeaderValue, StatusCode};

use crate::proxy::header_set::HeaderSet;

/// A redirect the caller should follow itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: StatusCode,
    /// Raw upstream `location`, unresolved and unmodified.
    pub location: HeaderValue,
}

/// Decide whether the final response becomes a redirect.
///
/// Upstream 301/302/303/307/308 are kept; anything else that carries
/// `location` (e.g. `201 Created` or `304 Not Modified`) is answered with
/// `302 Found`.
pub fn intercept(
    redirect_with_proxy: bool,
    status: StatusCode,
    headers: &HeaderSet,
) -> Option<Redirect> {
    if !redirect_with_proxy {
        return None;
    }
    let location = headers.get(&header::LOCATION)?;
    if location.is_empty() {
        return None;
    }

    let status = if is_redirect_status(status) {
        status
    } else {
        StatusCode::FOUND
    };

    Some(Redirect {
        status,
        location: location.clone(),
    })
}

/// Statuses a caller can follow as a redirect. 300, 304 and 305 are not.
fn is_redirect_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}
