//! Workspace umbrella crate.
//!
//! Host applications depend on `focus-radio` and get the [`core_service`]
//! façade re-exported. The `desktop-shims` feature (default) wires the
//! reqwest, SQLite and cpal adapters from `bridge-desktop`.

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_service::*;
