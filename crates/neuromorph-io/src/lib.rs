// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! # neuromorph file formats
//!
//! Decoders turn file bytes into the intermediate row schema of
//! [`neuromorph_core::RawMorphology`]; the tree builder in core does the rest.
//!
//! | Extension | Decoder | Writer |
//! |-----------|---------|--------|
//! | `.swc` | [`SwcDecoder`] | [`write_swc`] |
//! | `.asc` | [`AscDecoder`] | [`write_asc`] |
//! | `.nmb` | [`NmbDecoder`] | [`write_nmb`] |
//!
//! ```rust,no_run
//! use neuromorph_core::BuildOptions;
//! use neuromorph_io::load_morphology;
//!
//! let cell = load_morphology("cell.swc", &BuildOptions::default()).unwrap();
//! for section in cell.depth_first() {
//!     println!("{}", section);
//! }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod asc;
pub mod decoder;
mod error;
mod loader;
pub mod nmb;
pub mod swc;

pub use asc::{write_asc, AscDecoder};
pub use decoder::{Format, MorphologyDecoder, ReaderOptions};
pub use error::{IoError, IoResult};
pub use loader::{
    load_morphology, load_morphology_from_config, load_morphology_with, read_raw,
    save_morphology,
};
pub use nmb::{to_container, write_nmb, Dataset, DatasetData, NmbContainer, NmbDecoder};
pub use swc::{write_swc, SwcDecoder};
