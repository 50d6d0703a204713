//! Conversion, batch loading, seeding and integrity verification for the
//! REURB property export.
//!
//! The pipeline turns a PostgreSQL-style dump of `reurb_properties` into
//! batched upserts for an embedded DuckDB store, seeds the store from the
//! schema and seed files, and audits the project → quadra → property →
//! survey hierarchy for dangling references.

pub mod cmd;
pub mod config;
pub mod convert;
pub mod error;
pub mod input;
pub mod loader;
pub mod model;
pub mod seed;
pub mod store;
pub mod verify;

pub use error::{ParseError, PipelineError, Result, Stage};
