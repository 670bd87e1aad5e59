//! Request context subsystem.
//!
//! # Data Flow
//! ```text
//! query params ─┐
//! body fields  ─┼→ builder::build → ParamBag ──→ handler
//! uploads      ─┤
//! cookie jar   ─┘
//!
//! peer address → ip::client_ip → OutboundCaller (ip injected into every call)
//! ```
//!
//! # Design Decisions
//! - Later layers overwrite earlier keys: cookie, query, body, files
//! - A `cookie` string parameter replaces the header jar for that layer
//! - The bag is owned by one request and dropped when it completes

pub mod builder;
pub mod caller;
pub mod ip;
pub mod params;

pub use builder::build;
pub use caller::OutboundCaller;
pub use ip::{client_ip, normalize_ip};
pub use params::{Param, ParamBag, UploadedFile};
