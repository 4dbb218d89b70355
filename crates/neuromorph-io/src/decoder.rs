// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Decoder seam and format detection

use std::path::Path;

use neuromorph_config::ReadersConfig;
use neuromorph_core::RawMorphology;

use crate::asc::AscDecoder;
use crate::error::{IoError, IoResult};
use crate::nmb::NmbDecoder;
use crate::swc::SwcDecoder;

/// Anything that can turn a file's bytes into intermediate rows
pub trait MorphologyDecoder {
    /// Decode a whole file
    ///
    /// # Errors
    ///
    /// Any syntax or format-level problem; structural checks are left to the
    /// tree builder
    fn decode(&self, bytes: &[u8]) -> IoResult<RawMorphology>;
}

/// Options shared by the format readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Reject SWC files whose soma samples start more than one chain
    pub swc_strict_soma: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            swc_strict_soma: true,
        }
    }
}

impl From<&ReadersConfig> for ReaderOptions {
    fn from(config: &ReadersConfig) -> Self {
        Self {
            swc_strict_soma: config.swc_strict_soma,
        }
    }
}

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Swc,
    Asc,
    Nmb,
}

impl Format {
    /// Detect from a file extension, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns `UnknownExtension` for anything but `swc`, `asc` or `nmb`
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "swc" => Ok(Format::Swc),
            "asc" => Ok(Format::Asc),
            "nmb" => Ok(Format::Nmb),
            _ => Err(IoError::UnknownExtension(extension)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Swc => "swc",
            Format::Asc => "asc",
            Format::Nmb => "nmb",
        }
    }

    /// Decoder for this format
    pub fn decoder(self, options: &ReaderOptions) -> Box<dyn MorphologyDecoder> {
        match self {
            Format::Swc => Box::new(SwcDecoder::new(options.swc_strict_soma)),
            Format::Asc => Box::new(AscDecoder),
            Format::Nmb => Box::new(NmbDecoder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("cell.swc")).unwrap(), Format::Swc);
        assert_eq!(Format::from_path(Path::new("a/b/CELL.ASC")).unwrap(), Format::Asc);
        assert_eq!(Format::from_path(Path::new("cell.Nmb")).unwrap(), Format::Nmb);
        assert!(matches!(
            Format::from_path(Path::new("cell.h5")),
            Err(IoError::UnknownExtension(ext)) if ext == "h5"
        ));
        assert!(matches!(
            Format::from_path(Path::new("cell")),
            Err(IoError::UnknownExtension(_))
        ));
    }

    #[test]
    fn test_reader_options_from_config() {
        let config = ReadersConfig {
            swc_strict_soma: false,
        };
        assert!(!ReaderOptions::from(&config).swc_strict_soma);
        assert!(ReaderOptions::default().swc_strict_soma);
    }
}
