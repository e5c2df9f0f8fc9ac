//! Locus Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the domain types shared by every locus crate: packages,
//! layers, coordinates, lifecycle status, the error taxonomy, and the layered
//! service configuration.

pub mod config;
pub mod error;
pub mod models;

pub use error::{LocusError, Result};
