//! Application-level configuration.
//!
//! - [`CoordinationConfig`]: how the controller and views treat incomplete
//!   cohorts

pub mod coordination;

pub use coordination::CoordinationConfig;
