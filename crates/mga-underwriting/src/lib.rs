pub mod config;
pub mod error;
pub mod risk;
pub mod telemetry;
pub mod workflows;
