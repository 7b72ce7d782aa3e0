//! Marionette Face Geometry
//!
//! Turns already-detected facial landmarks into shape ratios, and audio
//! loudness into the same mouth-openness domain. This is NOT face detection:
//! points arrive from an external detector in the 68-point layout.
//!
//! # Ratios
//!
//! - EAR (eye aspect ratio): vertical eyelid distances over eye width
//! - MAR (mouth aspect ratio): vertical inner-lip distances over mouth width
//!
//! Both are pure functions of their input. Degenerate geometry is reported
//! as an error, never as NaN or infinity.

pub mod envelope;
pub mod landmarks;
pub mod ratio;

pub use envelope::*;
pub use landmarks::*;
pub use ratio::*;
