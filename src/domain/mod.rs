//! Domain layer types and invariants.

pub mod audit;
pub mod entities;
pub mod error;
pub mod ordering;
pub mod search;
pub mod slug;
