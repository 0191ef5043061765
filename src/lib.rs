//! BlockTrack - real-time transit vehicle location engine.
//!
//! This library fuses sparse, asynchronously arriving vehicle observation
//! reports with a static schedule model, maintains a bounded in-memory
//! recency window of fused results, and falls back to a durable overflow
//! store for queries outside that window.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a facade wiring all
//! the collaborators together:
//!
//! ```ignore
//! use blocktrack::service::{LocationService, LocationConfig};
//!
//! let service = LocationService::new(
//!     LocationConfig::default(),
//!     cache, store, oracle, graph, calendar,
//! );
//! service.start();
//!
//! service.ingest(report)?;
//! let answer = service.query_by_vehicle(&vehicle_id, TargetTime::new(target, now));
//! ```
//!
//! The static schedule (the oracle, graph and calendar in [`oracle`]) and
//! the durable store ([`store`]) are injected trait objects; the crate ships
//! in-memory implementations of the cache and store suitable for tests and
//! small deployments.

pub mod cache;
pub mod model;
pub mod oracle;
pub mod persistence;
pub mod query;
pub mod resolver;
pub mod service;
pub mod store;
pub mod synthesizer;

/// Version of the BlockTrack library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
