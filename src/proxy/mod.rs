//! Request transformation pipeline.
//!
//! # Data Flow
//! ```text
//! inbound query string
//!     → options.rs (parse Options, fail fast)
//!     → outbound.rs (HeaderSet for upstream, forced host)
//!     → upstream::Fetch (single GET)
//!     → inbound.rs (HeaderSet for caller, CORS)
//!     → redirect.rs (optional interception)
//!     → body.rs (stream or buffer + decode)
//!     → http::response (emit)
//! ```
//!
//! # Design Decisions
//! - Stateless: every value is built per request and dropped with it
//! - Header names are `HeaderName`s everywhere, so casing never matters
//! - `appendReqHeaders` shapes only the request, `appendResHeaders` only the response

pub mod body;
pub mod header_set;
pub mod inbound;
pub mod options;
pub mod outbound;
pub mod pipeline;
pub mod redirect;

pub use body::ResponseBody;
pub use header_set::HeaderSet;
pub use options::Options;
pub use pipeline::{handle, Forwarded, ProxyResponse};
pub use redirect::Redirect;
