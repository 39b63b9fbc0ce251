//! # Igbo TTS Common Library
//!
//! Shared code for the Igbo TTS dataset services:
//! - Common error type
//! - TOML configuration loading and setting resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
