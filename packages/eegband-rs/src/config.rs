use crate::backend::BackendKind;
use crate::error::{EegError, Result};
use crate::spectral::WelchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sample rate assumed for delimited-text inputs, which carry none
pub const DEFAULT_TEXT_SAMPLE_RATE: f64 = 256.0;

/// Accepted bounds for the text sample rate, in Hz
pub const TEXT_SAMPLE_RATE_RANGE: (f64, f64) = (1.0, 1_000_000.0);

/// Frequency range kept from the PSD before band averaging
pub const DEFAULT_PSD_RANGE_HZ: (f64, f64) = (0.5, 100.0);

/// Pipeline configuration
///
/// Every field has a default, so a JSON config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub text_sample_rate_hz: f64,
    pub welch: WelchConfig,
    pub psd_range_hz: (f64, f64),
    pub backend: BackendKind,
    /// Replace unreadable inputs with simulated records instead of failing
    pub simulate_on_failure: bool,
    /// Seed for every random substitution; None draws from the OS
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_sample_rate_hz: DEFAULT_TEXT_SAMPLE_RATE,
            welch: WelchConfig::default(),
            psd_range_hz: DEFAULT_PSD_RANGE_HZ,
            backend: BackendKind::Native,
            simulate_on_failure: true,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_text_sample_rate(mut self, hz: f64) -> Self {
        self.text_sample_rate_hz = hz;
        self
    }

    pub fn with_welch(mut self, welch: WelchConfig) -> Self {
        self.welch = welch;
        self
    }

    pub fn with_psd_range(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.psd_range_hz = (low_hz, high_hz);
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_simulate_on_failure(mut self, enabled: bool) -> Self {
        self.simulate_on_failure = enabled;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (min_rate, max_rate) = TEXT_SAMPLE_RATE_RANGE;
        if !(min_rate..=max_rate).contains(&self.text_sample_rate_hz) {
            return Err(EegError::InvalidParameter(format!(
                "text sample rate must be within {}-{} Hz, got {}",
                min_rate, max_rate, self.text_sample_rate_hz
            )));
        }

        let (low, high) = self.psd_range_hz;
        if !(low.is_finite() && high.is_finite() && low >= 0.0 && low < high) {
            return Err(EegError::InvalidParameter(format!(
                "invalid PSD range {}-{} Hz",
                low, high
            )));
        }

        self.welch.validate()
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EegError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;

        log::debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }
}
