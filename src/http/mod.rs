//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware, handler)
//!     → request.rs (request ID)
//!     → proxy::handle (transformation pipeline)
//!     → response.rs (emit forwarded body or redirect)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{build_router, HttpServer};
