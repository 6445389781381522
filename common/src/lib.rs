// Common library for the data-quality rule API

pub mod config;
pub mod db;
pub mod dq;
pub mod errors;
pub mod models;
pub mod telemetry;
