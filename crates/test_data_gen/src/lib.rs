//! Test data generator for reurb-seed integration tests.
//!
//! Generates deterministic, FK-consistent REURB hierarchies (projects,
//! quadras, properties, surveys) and renders them as the exported
//! `reurb_properties` dump plus seed SQL for the remaining tables.
//!
//! # Example
//!
//! ```rust
//! use test_data_gen::{DumpOptions, Generator, Scale};
//!
//! let mut gen = Generator::new(42, Scale::Small);
//! let data = gen.generate();
//!
//! let dump = data.render_dump(&DumpOptions::default());
//! let seed = data.render_seed();
//!
//! assert!(dump.contains("reurb_properties"));
//! assert!(seed.contains("reurb_quadras"));
//! ```

pub mod fake;
pub mod generator;

pub use generator::{
    ArrayQuoting, DumpOptions, GeneratedData, Generator, OrphanEdge, PropertyRow, ProjectRow,
    QuadraRow, Scale, SqlValue, SurveyRow, PROPERTY_COLUMNS,
};
