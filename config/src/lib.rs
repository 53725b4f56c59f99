//! # Config Crate
//!
//! Centralized configuration constants for the sculpt mesh generation
//! pipeline. All magic numbers and tunable parameters are defined here to
//! ensure consistency across crates.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{EPSILON, SEAM_WELD_DISTANCE};
//!
//! let value: f64 = 1e-11;
//! assert!(value.abs() < EPSILON);
//! assert!(SEAM_WELD_DISTANCE > 0.0);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;

#[cfg(test)]
mod tests;
