//! # ARPX Common Library
//!
//! Shared code for ARPX services including:
//! - Common error type
//! - TOML configuration loading and write-back
//! - Session identifier minting

pub mod config;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::SessionId;
