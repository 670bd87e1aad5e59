//! Handler registry subsystem.
//!
//! # Data Flow
//! ```text
//! Compiled-in units (endpoints::units)
//!     → naming::derive_route (user_account → /user/account)
//!     → overrides (built-in + configured) replace derived routes
//!     → Registry (route → RouteEntry, frozen at startup)
//!     → HTTP server registers one route per entry
//! ```
//!
//! # Design Decisions
//! - Routes built once at startup, immutable at runtime (no locks)
//! - Deterministic: the same units and overrides give the same table
//! - A route produced twice keeps the later registration

pub mod naming;
pub mod table;

pub use naming::{builtin_overrides, derive_route};
pub use table::{Registry, RouteEntry, Unit};
