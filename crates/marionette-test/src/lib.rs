//! Marionette Test Harness - Simulation and pipeline validation
//!
//! This crate provides:
//! - Scripted faces with exactly known eye/mouth ratios
//! - Camera and detector simulation (jitter, missed and bad frames)
//! - Full-session simulation on a virtual clock
//! - End-to-end integration testing

pub mod camera;
pub mod face_script;
pub mod integration;
pub mod simulator;

pub use camera::*;
pub use face_script::*;
pub use simulator::*;
