//! Core domain for FlowPilot.
//!
//! Window observations, the target-application classifier, the focus
//! hysteresis state machine, overlay placement, and shared configuration.
//! Everything here is synchronous and free of I/O apart from settings
//! persistence.

pub mod classifier;
pub mod clock;
pub mod error;
pub mod formatting;
pub mod hysteresis;
pub mod models;
pub mod placement;
pub mod settings;
pub mod stopwatch;
pub mod time_utils;
