//! Core domain types shared across the stage modules

pub mod error;
pub mod ids;
