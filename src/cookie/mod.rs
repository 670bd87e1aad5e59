//! Cookie codec subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound `Cookie` header
//!     → codec::decode (split, percent-decode, drop malformed pairs)
//!     → CookieJar (per request, never persisted)
//!
//! Handler envelope `cookie` lines
//!     → codec::encode (SameSite rewrite on TLS)
//!     → `Set-Cookie` response headers
//! ```
//!
//! # Design Decisions
//! - Decoding never fails; the worst case is an empty jar
//! - Keys are case-sensitive and the last duplicate wins
//! - The jar is a value owned by one request, not process state

pub mod codec;

pub use codec::{decode, encode, parse_pairs, strip_domain, to_header, CookieJar};
