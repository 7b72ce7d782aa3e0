//! Marionette Runtime - Sample-to-parameter synchronization
//!
//! This crate implements the pipeline between asynchronous sensors and the
//! fixed-cadence render loop:
//! 1. Producers turn landmarks / audio levels into raw samples
//! 2. Samples cross the thread boundary through bounded parameter channels
//! 3. The animation driver drains at most one sample per channel per tick,
//!    normalizes it, derives MOUTH_FORM and BREATH, and delivers one complete
//!    parameter map to the renderer
//!
//! The render tick never waits on a producer. Stopping a session closes every
//! channel so nothing from an old session reaches a new one.

pub mod channel;
pub mod config;
pub mod driver;
pub mod logging;
pub mod producer;
pub mod session;
pub mod sink;

pub use channel::*;
pub use config::*;
pub use driver::*;
pub use logging::*;
pub use producer::*;
pub use session::*;
pub use sink::*;
