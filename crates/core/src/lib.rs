//! fingerprint-core
//!
//! Core library for computing minimal distinguishing fingerprints of methods in a
//! compiled bytecode corpus.
//!
//! The pipeline runs strictly forward:
//! corpus -> [`features`] -> [`index`] -> [`search`] -> [`render`].
//!
//! [`service`] ties the pieces together behind a session object that owns the
//! current index snapshot, [`config`] loads settings files, and [`db`] keeps a
//! history of generated fingerprints for downstream resolvers.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, plugins, etc.).

pub mod config;
pub mod db;
pub mod features;
pub mod index;
pub mod model;
pub mod render;
pub mod search;
pub mod service;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
