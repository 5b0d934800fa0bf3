//! Derivative generation - everything that touches originals and derived files
//!
//! Structure:
//! - `generator`: the per-record generation seam used by the orchestrator
//! - `processors`: conversion execution (decode, resize, write, record)
//! - `queue`: deferred execution through a background worker

pub mod generator;
pub mod processors;
pub mod queue;
