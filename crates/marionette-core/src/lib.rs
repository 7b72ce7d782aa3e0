//! Marionette Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the Marionette pipeline:
//! - Animation parameters and the per-tick parameter map
//! - Calibration ranges and normalization
//! - Animation time
//! - Error types

pub mod calibration;
pub mod error;
pub mod param;
pub mod time;

pub use calibration::*;
pub use error::*;
pub use param::*;
pub use time::*;
