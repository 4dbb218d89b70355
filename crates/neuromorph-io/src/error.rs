// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Decoder, writer and loader errors

use neuromorph_core::MorphologyError;
use thiserror::Error;

/// Errors raised while reading or writing morphology files
///
/// `line` is the 1-based source line for text formats and the 0-based
/// structure row for NMB.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Line {line}: unsupported section type {code}")]
    UnsupportedSectionType { line: usize, code: i64 },

    #[error("Line {line}: sample id {id} was already defined on line {first_line}")]
    RepeatedId {
        line: usize,
        id: i64,
        first_line: usize,
    },

    #[error("Line {line}: sample {id} is its own parent")]
    SelfParent { line: usize, id: i64 },

    #[error("Line {line}: sample {id} references parent {parent}, which does not exist")]
    MissingParent { line: usize, id: i64, parent: i64 },

    #[error("Line {line}: soma sample {id} has a neurite parent")]
    SomaWithNeuriteParent { line: usize, id: i64 },

    #[error("Multiple somata found, starting on lines {lines:?}")]
    MultipleSomata { lines: Vec<usize> },

    #[error("Line {line}: soma is already defined")]
    SomaAlreadyDefined { line: usize },

    #[error("Line {line}: parenthesis opened here is never closed")]
    UnbalancedParens { line: usize },

    #[error("Line {line}: unexpected end of file")]
    UnexpectedEof { line: usize },

    #[error("Unknown morphology file extension: '{0}' (expected swc, asc or nmb)")]
    UnknownExtension(String),

    #[error("Invalid magic number: expected NMB1, got {0:?}")]
    BadMagic([u8; 4]),

    #[error("Missing dataset: {0}")]
    MissingDataset(String),

    #[error("Dataset {path}: {message}")]
    DatasetShape { path: String, message: String },

    #[error("Cannot write morphology: {0}")]
    Unwritable(String),

    #[error(transparent)]
    Build(#[from] MorphologyError),
}

impl IoError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        IoError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn shape(path: &str, message: impl Into<String>) -> Self {
        IoError::DatasetShape {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for decoding, writing and loading
pub type IoResult<T> = Result<T, IoError>;
