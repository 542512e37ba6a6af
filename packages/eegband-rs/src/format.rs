/// Format dispatcher
///
/// Maps a file path to the decode strategy that handles it. Purely a function
/// of the file name; nothing is read from disk here.
use crate::error::{EegError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions decoded by the native EDF/BDF reader
pub const NATIVE_EXTENSIONS: &[&str] = &["edf", "bdf"];

/// Extensions decoded by the delimited-text reader
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "txt", "dat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// European Data Format, 16-bit samples
    Edf,
    /// BioSemi Data Format, 24-bit samples
    Bdf,
    /// Numeric matrix in a text file (rows = channels)
    DelimitedText,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "edf" => Some(Self::Edf),
            "bdf" => Some(Self::Bdf),
            "csv" | "txt" | "dat" => Some(Self::DelimitedText),
            _ => None,
        }
    }

    /// Select the decode strategy for `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        Self::from_extension(extension).ok_or_else(|| {
            EegError::UnsupportedFormat(format!(
                "'{}' (extension '{}'); supported: {}",
                path.display(),
                extension,
                Self::supported_extensions().join(", ")
            ))
        })
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Edf | Self::Bdf)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Edf => "EDF",
            Self::Bdf => "BDF",
            Self::DelimitedText => "Delimited text",
        }
    }

    /// Bytes per stored sample in a native container
    pub fn sample_width(&self) -> Option<usize> {
        match self {
            Self::Edf => Some(2),
            Self::Bdf => Some(3),
            Self::DelimitedText => None,
        }
    }

    pub fn supported_extensions() -> Vec<&'static str> {
        let mut exts = NATIVE_EXTENSIONS.to_vec();
        exts.extend_from_slice(TEXT_EXTENSIONS);
        exts
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}
