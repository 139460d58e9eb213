//! Common utilities module
//!
//! This module contains shared utilities used across the viewfinder.

pub mod error;

pub use error::{ViewfinderError, Result};
