//! # Core Tones
//!
//! Oscillator-bank tone generator for focus sounds: the Schumann resonance
//! and the solfeggio frequencies, each independently faded in and out and
//! summed through one master volume stage.
//!
//! ## Overview
//!
//! - [`ToneEngine`](engine::ToneEngine) - control surface (enable, disable, volumes)
//! - [`ToneMixer`](mixer::ToneMixer) - the [`AudioRenderer`](bridge_traits::AudioRenderer)
//!   the host output pulls samples from
//! - [`ToneCatalog`](catalog::ToneCatalog) - the fixed list of tones
//!
//! ## Usage
//!
//! ```ignore
//! use core_tones::{ToneCatalog, ToneConfig, ToneEngine};
//!
//! let engine = ToneEngine::new(ToneCatalog::default(), output, ToneConfig::default());
//! engine.enable("528")?;
//! engine.set_volume("528", 0.3);
//! engine.disable("528"); // fades out, voice released 600 ms later
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod oscillator;

pub use catalog::{ToneCatalog, ToneDefinition, Waveform};
pub use config::{ToneConfig, MAX_TONE_VOLUME};
pub use engine::{ActiveTone, ToneEngine};
pub use error::{Result, ToneError};
pub use mixer::ToneMixer;
