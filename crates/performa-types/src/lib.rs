//! # performa-types
//!
//! The `Deal` and `Settings` schema that describes a real-estate deal to the
//! analysis engine, and the pure `validate` pass that checks it before a run
//! starts.

pub mod schema;
pub mod validation;

pub use schema::*;
pub use validation::validate;
