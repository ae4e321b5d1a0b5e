//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the focus radio core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, the fail-fast configuration
//! builder and the broadcast event bus shared by the player, the tone engine
//! and the orchestrator.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
