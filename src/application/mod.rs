//! Application services layer.

pub mod audit;
pub mod entries;
pub mod error;
pub mod repos;
pub mod session;
