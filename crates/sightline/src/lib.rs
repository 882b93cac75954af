//! Headless runner and configuration for Sightline
//!
//! The engine lives in `sightline-core`; this crate adds layered
//! configuration and scripted tours on top of it.

pub mod config;
pub mod tour;

pub use config::SightlineConfig;
