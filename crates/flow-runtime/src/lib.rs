//! Runtime layer for FlowPilot.
//!
//! Drives the focus tracker on a fixed cadence: probes the foreground window,
//! runs classification and hysteresis, commands the overlay, appends to the
//! audit log and streams state changes to the UI boundary.

pub mod activity;
pub mod orchestrator;
pub mod overlay;
pub mod probe;
pub mod ticker;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use flow_core as core;
pub use flow_data as data;
