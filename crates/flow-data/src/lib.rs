//! Persistence layer for FlowPilot.
//!
//! Writes the per-tick audit trail as JSONL, reads it back, and rolls it up
//! into daily focus summaries.

pub mod aggregator;
pub mod audit;
pub mod reader;

pub use flow_core as core;
