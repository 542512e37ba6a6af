use crate::error::{EegError, Result};
use crate::format::FileFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical EEG frequency bands, low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    pub fn name(&self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    /// Frequency window in Hz. Lower bound inclusive, upper bound exclusive
    /// except for gamma, which includes 100 Hz.
    pub fn range_hz(&self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 100.0),
        }
    }

    pub fn contains(&self, freq_hz: f64) -> bool {
        let (low, high) = self.range_hz();
        match self {
            Band::Gamma => freq_hz >= low && freq_hz <= high,
            _ => freq_hz >= low && freq_hz < high,
        }
    }

    /// Bounds for simulated values when the band cannot be measured
    pub fn fallback_range(&self) -> (f64, f64) {
        match self {
            Band::Delta => (15.0, 30.0),
            Band::Theta => (20.0, 35.0),
            Band::Alpha => (25.0, 40.0),
            Band::Beta => (30.0, 45.0),
            Band::Gamma => (10.0, 20.0),
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Average power per band. One field per band so the serialized key order is
/// always delta, theta, alpha, beta, gamma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }

    pub fn set(&mut self, band: Band, value: f64) {
        let slot = match band {
            Band::Delta => &mut self.delta,
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Gamma => &mut self.gamma,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.iter().map(move |&band| (band, self.get(band)))
    }
}

/// Which pathway produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    NativeBinary,
    DelimitedText,
    FallbackSimulated,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::NativeBinary => "native-binary",
            SourceKind::DelimitedText => "delimited-text",
            SourceKind::FallbackSimulated => "fallback-simulated",
        }
    }
}

impl From<FileFormat> for SourceKind {
    fn from(format: FileFormat) -> Self {
        if format.is_native() {
            SourceKind::NativeBinary
        } else {
            SourceKind::DelimitedText
        }
    }
}

/// Signal matrix decoded from a file, before summarization
#[derive(Debug, Clone)]
pub struct DecodedSignal {
    pub data: Vec<Vec<f64>>, // [channel][sample]
    pub sample_rate: f64,
    pub channel_names: Vec<String>,
    pub format: FileFormat,
    pub processing_method: String,
}

impl DecodedSignal {
    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    pub fn num_samples(&self) -> usize {
        self.data.first().map(|ch| ch.len()).unwrap_or(0)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.num_channels(), self.num_samples())
    }

    pub fn duration(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate
    }

    /// Average all channels into one representative waveform
    pub fn mean_waveform(&self) -> Vec<f64> {
        let num_channels = self.num_channels();
        if num_channels == 0 {
            return Vec::new();
        }

        let mut mean = vec![0.0; self.num_samples()];
        for channel in &self.data {
            for (acc, &value) in mean.iter_mut().zip(channel) {
                *acc += value;
            }
        }
        let scale = 1.0 / num_channels as f64;
        mean.iter_mut().for_each(|v| *v *= scale);
        mean
    }
}

/// Everything needed to build a [`SignalRecord`]; duration and shape are
/// derived from it so the record invariants hold by construction.
#[derive(Debug, Clone)]
pub struct RecordParts {
    pub file_path: String,
    pub source_kind: SourceKind,
    pub processing_method: String,
    pub sampling_rate_hz: f64,
    pub channel_names: Vec<String>,
    pub sample_count: usize,
    pub band_powers: BandPowers,
    pub simulated_bands: Vec<Band>,
    pub quality_score: f64,
    pub fallback_reason: Option<String>,
}

/// Result of processing one input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    #[serde(rename = "source")]
    source_kind: SourceKind,
    file_path: String,
    #[serde(rename = "sampling_rate")]
    sampling_rate_hz: f64,
    #[serde(rename = "n_channels")]
    channel_count: usize,
    duration_seconds: f64,
    channel_names: Vec<String>,
    #[serde(rename = "data_shape")]
    raw_matrix_shape: (usize, usize),
    #[serde(rename = "frequency_bands")]
    band_powers: BandPowers,
    quality_score: f64,
    processing_method: String,
    id: String,
    processed_at: String,
    #[serde(default)]
    simulated_bands: Vec<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
}

impl SignalRecord {
    pub fn new(parts: RecordParts) -> Result<Self> {
        if !(parts.sampling_rate_hz.is_finite() && parts.sampling_rate_hz > 0.0) {
            return Err(EegError::InvalidRecord(format!(
                "sampling rate must be positive, got {}",
                parts.sampling_rate_hz
            )));
        }
        if parts.channel_names.is_empty() {
            return Err(EegError::InvalidRecord("record has no channels".to_string()));
        }
        if parts.sample_count == 0 {
            return Err(EegError::InvalidRecord("record has no samples".to_string()));
        }
        let duration = parts.sample_count as f64 / parts.sampling_rate_hz;
        if !duration.is_finite() {
            return Err(EegError::InvalidRecord(format!(
                "{} samples at {} Hz give a non-finite duration",
                parts.sample_count, parts.sampling_rate_hz
            )));
        }
        if let Some((band, value)) = parts
            .band_powers
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
        {
            return Err(EegError::InvalidRecord(format!(
                "band '{}' has invalid power {}",
                band, value
            )));
        }

        Ok(Self::assemble(parts))
    }

    /// Build without checking; callers guarantee a positive rate, at least one
    /// channel and sample, and finite non-negative band powers.
    pub(crate) fn assemble(parts: RecordParts) -> Self {
        let channel_count = parts.channel_names.len();
        let quality_score = if parts.quality_score.is_finite() {
            parts.quality_score.clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            source_kind: parts.source_kind,
            file_path: parts.file_path,
            sampling_rate_hz: parts.sampling_rate_hz,
            channel_count,
            duration_seconds: parts.sample_count as f64 / parts.sampling_rate_hz,
            channel_names: parts.channel_names,
            raw_matrix_shape: (channel_count, parts.sample_count),
            band_powers: parts.band_powers,
            quality_score,
            processing_method: parts.processing_method,
            id: uuid::Uuid::new_v4().to_string(),
            processed_at: chrono::Utc::now().to_rfc3339(),
            simulated_bands: parts.simulated_bands,
            fallback_reason: parts.fallback_reason,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn raw_matrix_shape(&self) -> (usize, usize) {
        self.raw_matrix_shape
    }

    pub fn band_powers(&self) -> &BandPowers {
        &self.band_powers
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn processing_method(&self) -> &str {
        &self.processing_method
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn processed_at(&self) -> &str {
        &self.processed_at
    }

    pub fn simulated_bands(&self) -> &[Band] {
        &self.simulated_bands
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    /// True when every value was derived from the input file
    pub fn is_measured(&self) -> bool {
        self.source_kind != SourceKind::FallbackSimulated && self.simulated_bands.is_empty()
    }

    /// Check the structural invariants, e.g. after deserializing a record
    /// produced elsewhere.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.raw_matrix_shape;
        if self.channel_count != self.channel_names.len() || self.channel_count != rows {
            return Err(EegError::InvalidRecord(format!(
                "channel count {} disagrees with {} names and shape {:?}",
                self.channel_count,
                self.channel_names.len(),
                self.raw_matrix_shape
            )));
        }
        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return Err(EegError::InvalidRecord(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate_hz
            )));
        }

        let expected = cols as f64 / self.sampling_rate_hz;
        if !(expected.is_finite() && self.duration_seconds.is_finite()) {
            return Err(EegError::InvalidRecord(format!(
                "duration {} for {} samples at {} Hz is not finite",
                self.duration_seconds, cols, self.sampling_rate_hz
            )));
        }
        if (self.duration_seconds - expected).abs() > 1e-9 * expected.max(1.0) {
            return Err(EegError::InvalidRecord(format!(
                "duration {} does not match {} samples at {} Hz",
                self.duration_seconds, cols, self.sampling_rate_hz
            )));
        }
        if !(0.0..=100.0).contains(&self.quality_score) {
            return Err(EegError::InvalidRecord(format!(
                "quality score {} outside [0, 100]",
                self.quality_score
            )));
        }
        if let Some((band, value)) = self
            .band_powers
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
        {
            return Err(EegError::InvalidRecord(format!(
                "band '{}' has invalid power {}",
                band, value
            )));
        }
        Ok(())
    }

    pub fn to_json(&self, compact: bool) -> Result<String> {
        let json = if compact {
            serde_json::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        Ok(json)
    }

    /// Parse a record and check its invariants
    pub fn from_json(json: &str) -> Result<Self> {
        let record: SignalRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn write_json(&self, path: &Path, compact: bool) -> Result<()> {
        let json = self.to_json(compact)?;
        std::fs::write(path, json)?;
        log::debug!("Wrote signal record {} to {}", self.id, path.display());
        Ok(())
    }
}
