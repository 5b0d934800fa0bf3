//! Bulk regeneration of derived media files.
//!
//! A [`selection`] resolves which records to touch into a lazy stream, and
//! the [`regenerate`] orchestrator drives a [`background::generator::DerivativeGenerator`]
//! over it with per-record failure isolation.

pub mod background;
pub mod bootstrap;
pub mod common;
pub mod config;
pub mod database;
pub mod regenerate;
pub mod selection;
pub mod utils;
