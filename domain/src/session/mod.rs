//! Shared session document

pub mod entities;

pub use entities::Session;
