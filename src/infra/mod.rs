//! Infrastructure adapters and runtime bootstrap.

pub mod bootstrap;
pub mod db;
pub mod docstore;
pub mod error;
pub mod memory;
pub mod telemetry;
