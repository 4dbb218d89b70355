// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
# Neuromorph Core

Canonical in-memory model of a neuronal morphology.

- [`Morphology`]: immutable forest of neurite [`Section`]s, one [`Soma`] and
  optional [`Mitochondria`]
- [`MorphologyBuilder`]: turns decoder output ([`RawMorphology`]) into a
  validated morphology
- [`traverse`]: depth-first, breadth-first and upstream walks over either
  forest

Decoders live in `neuromorph-io`; this crate only knows the intermediate row
schema in [`raw`].
*/

mod builder;
mod error;
pub mod iter;
mod mitochondria;
mod morphology;
pub mod raw;
mod section;
mod soma;
pub mod types;

pub use builder::{build_morphology, BuildOptions, MorphologyBuilder};
pub use error::{ErrorKind, MorphResult, MorphologyError};
pub use iter::{traverse, IterType, Start, Traversal, TreeTopology};
pub use mitochondria::{MitoSection, Mitochondria};
pub use morphology::Morphology;
pub use neuromorph_config::MitoAnchorPolicy;
pub use raw::{MitoRow, NeuriteRow, RawMorphology, RowId, SomaRow, NO_PARENT};
pub use section::{Section, SectionId};
pub use soma::Soma;
pub use types::{Point, SectionType, SomaType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::{
        build_morphology, BuildOptions, IterType, MitoSection, Mitochondria, Morphology,
        MorphologyBuilder, MorphologyError, Point, RawMorphology, Section, SectionId, SectionType,
        Soma, SomaType,
    };
}
