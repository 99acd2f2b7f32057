//! Donor retention analytics for the public blood-donation datasets.
//!
//! The engine lives in [`analyzer`]; [`pipeline`] wires loading and
//! computation together, [`report`] and [`notifier`] handle delivery.

pub mod analyzer;
pub mod config;
pub mod loader;
pub mod model;
pub mod notifier;
pub mod pipeline;
pub mod report;
pub mod utils;
