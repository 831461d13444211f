// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by subsystem
mod aggregation;
mod config;
mod error;
mod model;
mod render;
mod storage;
mod telemetry;
