//! # Memory Management
//!
//! Backing arrays are plain vectors grown in chunks, so that steady appends do not
//! reallocate on every insert.

mod growth;

pub use growth::GrowthPolicy;
