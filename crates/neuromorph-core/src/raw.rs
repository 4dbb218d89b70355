// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Intermediate row schema produced by format decoders.
//!
//! Every decoder, whatever its on-disk format, emits a [`RawMorphology`].
//! The tree builder depends on nothing else, so adding a format never
//! touches the core.

use serde::{Deserialize, Serialize};

use crate::types::{Point, SectionType, SomaType};

/// Identifier a decoder gives to one of its rows
pub type RowId = i64;

/// Parent sentinel some formats use for "no parent"
pub const NO_PARENT: RowId = -1;

/// Returns the parent row id, or `None` for roots (absent or negative sentinel)
pub(crate) fn resolve_parent(parent_row_id: Option<RowId>) -> Option<RowId> {
    parent_row_id.filter(|&id| id >= 0)
}

/// One neurite section as read from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuriteRow {
    pub row_id: RowId,
    pub section_type: SectionType,
    pub points: Vec<Point>,
    pub diameters: Vec<f32>,
    #[serde(default)]
    pub perimeters: Option<Vec<f32>>,
    #[serde(default)]
    pub parent_row_id: Option<RowId>,
}

impl NeuriteRow {
    pub fn new(
        row_id: RowId,
        section_type: SectionType,
        points: Vec<Point>,
        diameters: Vec<f32>,
        parent_row_id: Option<RowId>,
    ) -> Self {
        Self {
            row_id,
            section_type,
            points,
            diameters,
            perimeters: None,
            parent_row_id,
        }
    }

    pub fn with_perimeters(mut self, perimeters: Vec<f32>) -> Self {
        self.perimeters = Some(perimeters);
        self
    }

    /// True when the row starts a new tree
    pub fn is_root(&self) -> bool {
        resolve_parent(self.parent_row_id).is_none()
    }
}

/// Cell body samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SomaRow {
    #[serde(default)]
    pub soma_type: SomaType,
    pub points: Vec<Point>,
    pub diameters: Vec<f32>,
}

/// One mitochondrial section as read from disk
///
/// `neurite_section_ids` carries canonical section ids encoded as floats,
/// which is how point-table formats store them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitoRow {
    pub row_id: RowId,
    pub diameters: Vec<f32>,
    pub relative_path_lengths: Vec<f32>,
    pub neurite_section_ids: Vec<f32>,
    #[serde(default)]
    pub parent_row_id: Option<RowId>,
}

/// Everything a decoder hands to the tree builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMorphology {
    pub neurites: Vec<NeuriteRow>,
    #[serde(default)]
    pub soma: Option<SomaRow>,
    #[serde(default)]
    pub mitochondria: Vec<MitoRow>,
}
