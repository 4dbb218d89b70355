// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Error types for morphology construction and traversal

use crate::raw::RowId;
use crate::section::SectionId;

/// Coarse classification of a [`MorphologyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rows do not describe a valid forest (unknown parent, cycle, bad arrays)
    Structural,
    /// A mitochondrial anchor names a neurite section that does not exist
    Reference,
    /// The caller asked for something the model cannot answer
    Usage,
}

/// Errors raised while building or querying a morphology
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MorphologyError {
    #[error("Row {row_id} references parent {parent_id}, which has not been seen yet")]
    MissingParent { row_id: RowId, parent_id: RowId },

    #[error("Row {row_id} is its own parent")]
    Cycle { row_id: RowId },

    #[error("Row id {row_id} appears more than once")]
    RepeatedId { row_id: RowId },

    #[error("Row id {row_id} is negative")]
    InvalidRowId { row_id: RowId },

    #[error("Row {row_id}: {left} has {left_len} entries but {right} has {right_len}")]
    ArrayLengthMismatch {
        row_id: RowId,
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("Row {row_id} has {count} point(s), at least {minimum} required")]
    TooFewPoints {
        row_id: RowId,
        count: usize,
        minimum: usize,
    },

    #[error("Row {row_id} is a neurite section typed as soma")]
    SomaTypedNeurite { row_id: RowId },

    #[error("Mitochondrial row {row_id} references parent {parent_id}, which has not been seen yet")]
    MissingMitoParent { row_id: RowId, parent_id: RowId },

    #[error("Mitochondrial row {row_id}: relative path length {value} is outside [0, 1]")]
    InvalidPathLength { row_id: RowId, value: f32 },

    #[error("Mitochondrial row {row_id} is anchored to neurite section {anchor}, which does not exist")]
    UnresolvedAnchor { row_id: RowId, anchor: f32 },

    #[error("Upstream traversal needs a single section, not a whole morphology")]
    UpstreamFromForest,

    #[error("Section {0} does not exist")]
    SectionNotFound(SectionId),

    #[error("Soma has {points} point(s) but {diameters} diameter(s)")]
    SomaArrayMismatch { points: usize, diameters: usize },
}

impl MorphologyError {
    /// Which family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorphologyError::MissingParent { .. }
            | MorphologyError::Cycle { .. }
            | MorphologyError::RepeatedId { .. }
            | MorphologyError::InvalidRowId { .. }
            | MorphologyError::ArrayLengthMismatch { .. }
            | MorphologyError::TooFewPoints { .. }
            | MorphologyError::SomaTypedNeurite { .. }
            | MorphologyError::MissingMitoParent { .. }
            | MorphologyError::InvalidPathLength { .. } => ErrorKind::Structural,
            MorphologyError::UnresolvedAnchor { .. } => ErrorKind::Reference,
            MorphologyError::UpstreamFromForest
            | MorphologyError::SectionNotFound(_)
            | MorphologyError::SomaArrayMismatch { .. } => ErrorKind::Usage,
        }
    }
}

/// Result type for morphology operations
pub type MorphResult<T> = Result<T, MorphologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            MorphologyError::MissingParent {
                row_id: 3,
                parent_id: 9
            }
            .kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            MorphologyError::UnresolvedAnchor {
                row_id: 0,
                anchor: 12.0
            }
            .kind(),
            ErrorKind::Reference
        );
        assert_eq!(MorphologyError::UpstreamFromForest.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = MorphologyError::TooFewPoints {
            row_id: 4,
            count: 1,
            minimum: 2,
        };
        assert_eq!(err.to_string(), "Row 4 has 1 point(s), at least 2 required");
    }
}
