//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound (query, body, files, cookie header, peer, tls)
//!     → cookie::decode
//!     → context::build → ParamBag
//!     → cache lookup (hit: reply immediately)
//!     → handler.call(bag, OutboundCaller)
//!     → interpret (settled envelope → reply)
//!     → cookie::encode (SameSite rewrite on TLS)
//!     → cache store (200 only)
//! ```
//!
//! # Design Decisions
//! - Each request is dispatched at most once; no retries
//! - Success and rejection share the envelope shape and are matched explicitly
//! - Logging records the outcome and never changes the reply

pub mod dispatcher;
pub mod envelope;
pub mod handler;

pub use dispatcher::{interpret, Dispatcher, Inbound, Outcome};
pub use envelope::{Envelope, HandlerResult, LOGIN_REQUIRED_MSG};
pub use handler::Handler;
