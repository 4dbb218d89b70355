//! # neuromorph
//!
//! Canonical, immutable neuronal morphology trees. Cells read from SWC,
//! Neurolucida ASC or NMB files are built into one [`Morphology`] model:
//! a forest of neurite sections, a soma, and optional mitochondria, all
//! walkable depth first, breadth first, or upstream towards a root.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neuromorph = "0.1"  # Default: io + config + observability
//! ```
//!
//! ```rust,no_run
//! use neuromorph::prelude::*;
//!
//! let cell = load_morphology("cell.asc", &BuildOptions::default())?;
//! for section in cell.iter(IterType::BreadthFirst)? {
//!     println!("{} {:?} depth={}", section.id(), section.section_type(), section.depth());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`io`** (default): SWC, ASC and NMB decoders and writers
//! - **`config`** (default): TOML configuration with environment overrides
//! - **`observability`** (default): tracing subscriber setup and `--debug-<crate>` flags
//! - **`file-logging`**: JSON log files per run
//!
//! Without `io` the model can still be built from rows directly:
//!
//! ```rust
//! use neuromorph::{build_morphology, NeuriteRow, RawMorphology, SectionType};
//!
//! let raw = RawMorphology {
//!     neurites: vec![NeuriteRow::new(
//!         0,
//!         SectionType::Axon,
//!         vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!         vec![1.0, 1.0],
//!         None,
//!     )],
//!     ..RawMorphology::default()
//! };
//! let cell = build_morphology(raw)?;
//! assert_eq!(cell.n_sections(), 1);
//! # Ok::<(), neuromorph::MorphologyError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neuromorph-config                          │
//! │  (build, reader and logging settings)                   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Model: neuromorph-core                                 │
//! │  (Section, Soma, Mitochondria, tree builder, traversal) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  I/O: neuromorph-io                                     │
//! │  (SWC / ASC / NMB decoders and writers)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export the model
pub use neuromorph_core as model;
pub use neuromorph_core::*;

// Re-export I/O layer
#[cfg(feature = "io")]
pub use neuromorph_io as io;

#[cfg(feature = "io")]
pub use neuromorph_io::{load_morphology, load_morphology_from_config, save_morphology, IoError};

// Re-export infrastructure
#[cfg(feature = "config")]
pub use neuromorph_config as config;

#[cfg(feature = "observability")]
pub use neuromorph_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use neuromorph_core::prelude::*;
    pub use neuromorph_core::{MitoAnchorPolicy, Start, Traversal, TreeTopology};

    #[cfg(feature = "io")]
    pub use neuromorph_io::{load_morphology, save_morphology, Format, IoError};

    #[cfg(feature = "config")]
    pub use neuromorph_config::{load_config, NeuromorphConfig};
}
