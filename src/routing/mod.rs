//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, method)
//!     → router.rs (ordered scan)
//!     → matcher.rs (evaluate match conditions)
//!     → pattern.rs (host / path glob matching)
//!     → Return: matched Route or None
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Parse patterns, target URI, filters
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - No regex in hot path (segment-wise glob matching)
//! - Deterministic: same input always matches same route
//! - First match wins, in registration order

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::Matcher;
pub use pattern::{HostPattern, PathPattern, PatternError};
pub use router::{Route, RouteBuilder, RouteError, Router, TargetUri};
