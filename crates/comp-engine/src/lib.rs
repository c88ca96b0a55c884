pub mod config;
pub mod dataset;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod telemetry;
