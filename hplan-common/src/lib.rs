//! # Hausplaner Common Library
//!
//! Shared code for the Hausplaner crates:
//! - Error types
//! - Configuration loading (CLI → ENV → TOML → defaults)
//! - Clock abstraction for time-dependent components

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::{Clock, ManualClock, SystemClock};
