//! Marionette Time - Animation clocks and tick scheduling
//!
//! This crate implements the timing side of the pipeline:
//! - Animation clocks (monotonic wall clock, manual clock for headless runs)
//! - Tick schedulers exposing `on_tick` registration, backed either by a
//!   tokio interval or by explicit manual firing

pub mod clock;
pub mod scheduler;

pub use clock::*;
pub use scheduler::*;
