//! SandWind Core - Foundational types for the SandWind engine
//!
//! This crate provides the core types that all other SandWind crates depend on:
//! - `hash_seed` - FNV-1a string seed hashing
//! - `Color` - RGBA colour with hex and HSL constructors
//! - Error types and Result alias

mod error;
mod hash;
mod types;

pub use error::{Result, SandError};
pub use hash::{hash_seed, hash_seed_unit};
pub use types::Color;
