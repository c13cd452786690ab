//! HTTP API handlers for fvr-engine
//!
//! JSON only. Every handler reads one snapshot of the result table; only
//! `POST /api/reload` triggers a rebuild.

pub mod health;
pub mod reload;
pub mod venues;

pub use health::health_routes;
pub use reload::reload_routes;
pub use venues::venue_routes;
