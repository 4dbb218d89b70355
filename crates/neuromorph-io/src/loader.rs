// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Path-based loading and saving

use std::fs;
use std::path::Path;

use neuromorph_config::NeuromorphConfig;
use neuromorph_core::{BuildOptions, Morphology, MorphologyBuilder, RawMorphology};
use tracing::info;

use crate::asc::write_asc;
use crate::decoder::{Format, ReaderOptions};
use crate::error::IoResult;
use crate::nmb::write_nmb;
use crate::swc::write_swc;

/// Decode a file into intermediate rows without building
///
/// # Errors
///
/// Unknown extension, unreadable file, or any decoder error
pub fn read_raw<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> IoResult<RawMorphology> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let bytes = fs::read(path)?;
    format.decoder(options).decode(&bytes)
}

/// Load and build a morphology, picking the decoder from the file extension
///
/// # Errors
///
/// Any decoder error, or a `Build` error from the tree builder
pub fn load_morphology<P: AsRef<Path>>(path: P, options: &BuildOptions) -> IoResult<Morphology> {
    load_morphology_with(path, &ReaderOptions::default(), options)
}

/// [`load_morphology`] with explicit reader options
///
/// # Errors
///
/// See [`load_morphology`]
pub fn load_morphology_with<P: AsRef<Path>>(
    path: P,
    reader: &ReaderOptions,
    options: &BuildOptions,
) -> IoResult<Morphology> {
    let path = path.as_ref();
    let raw = read_raw(path, reader)?;
    let morphology = MorphologyBuilder::new(*options).build(raw)?;
    info!(
        target: "neuromorph-io",
        path = %path.display(),
        sections = morphology.n_sections(),
        "Loaded morphology"
    );
    Ok(morphology)
}

/// [`load_morphology`] with reader and build options taken from configuration
///
/// # Errors
///
/// See [`load_morphology`]
pub fn load_morphology_from_config<P: AsRef<Path>>(
    path: P,
    config: &NeuromorphConfig,
) -> IoResult<Morphology> {
    load_morphology_with(
        path,
        &ReaderOptions::from(&config.readers),
        &BuildOptions::from_config(config),
    )
}

/// Write a morphology in the format named by the file extension
///
/// # Errors
///
/// Unknown extension, a write failure, or a morphology the format cannot
/// express
pub fn save_morphology<P: AsRef<Path>>(morphology: &Morphology, path: P) -> IoResult<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Swc => fs::write(path, write_swc(morphology))?,
        Format::Asc => fs::write(path, write_asc(morphology)?)?,
        Format::Nmb => fs::write(path, write_nmb(morphology)?)?,
    }
    info!(target: "neuromorph-io", path = %path.display(), "Saved morphology");
    Ok(())
}
