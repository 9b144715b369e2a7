//! Taste profiling and similarity engine
//!
//! Summarizes a user's watched-media history into a compact preference
//! profile (a [`models::TasteMap`]) and compares two users' profiles into a
//! bounded, reproducible compatibility score. Includes the cache-aside
//! profile layer, durable pairwise score storage, and the batch scheduler
//! that recomputes scores across the population without all-pairs blow-up.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
