//! Inspect, clean and convert tabular files.
//!
//! The pipeline is `load → clean → select → export`; see [`data`] for the
//! stages and [`config`] for the user-tunable settings.

pub mod config;
pub mod data;

pub use config::SweeperConfig;
pub use data::{Result, SweepError};
