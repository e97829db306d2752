//! Sample Factory - learn a spec from sample JSON records, build synthetic ones
//!
//! Provides:
//! - Per-field analysis of sample records (formats, numbers, choices, patterns)
//! - A portable JSON spec document with presence and shape information
//! - A seeded factory that generates records from a spec, with overrides
//!
//! This crate re-exports [`sample_factory_core`]; the `sfac` binary lives in
//! `crates/cli`.

pub use sample_factory_core::*;
