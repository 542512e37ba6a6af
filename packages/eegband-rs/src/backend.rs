/// Spectral backends
///
/// Native container decoding and PSD estimation sit behind one trait so the
/// pipeline can run with or without them. The backend is chosen once, when the
/// pipeline is built.
use crate::edf::EdfReader;
use crate::error::{EegError, Result};
use crate::format::FileFormat;
use crate::spectral::{welch_psd, Psd, WelchConfig};
use crate::types::DecodedSignal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub trait SpectralBackend: Send + Sync {
    /// Short identifier used in logs and processing-method tags
    fn name(&self) -> &str;

    /// Decode an EDF/BDF container into a signal matrix
    fn decode_native(&self, path: &Path, format: FileFormat) -> Result<DecodedSignal>;

    /// Estimate the power spectral density of one waveform
    fn welch_psd(&self, signal: &[f64], sample_rate: f64, config: &WelchConfig) -> Result<Psd>;
}

/// Built-in EDF/BDF decoder and rustfft Welch estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl SpectralBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn decode_native(&self, path: &Path, format: FileFormat) -> Result<DecodedSignal> {
        if !format.is_native() {
            return Err(EegError::UnsupportedFormat(format!(
                "{} is not a native container format",
                format.label()
            )));
        }
        EdfReader::open(path, format)?.read_all()
    }

    fn welch_psd(&self, signal: &[f64], sample_rate: f64, config: &WelchConfig) -> Result<Psd> {
        welch_psd(signal, sample_rate, config)
    }
}

/// Stand-in used when spectral support is switched off; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl SpectralBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn decode_native(&self, path: &Path, format: FileFormat) -> Result<DecodedSignal> {
        Err(EegError::BackendUnavailable(format!(
            "cannot decode {} file {}",
            format.label(),
            path.display()
        )))
    }

    fn welch_psd(&self, _signal: &[f64], _sample_rate: f64, _config: &WelchConfig) -> Result<Psd> {
        Err(EegError::BackendUnavailable(
            "spectral estimation is disabled".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Native,
    Unavailable,
}

impl BackendKind {
    pub fn build(&self) -> Arc<dyn SpectralBackend> {
        match self {
            BackendKind::Native => Arc::new(NativeBackend),
            BackendKind::Unavailable => Arc::new(UnavailableBackend),
        }
    }
}
