//! Synthetic stand-in records for inputs that could not be decoded.
//!
//! Every value here is random within plausible bounds and the record is
//! tagged `fallback-simulated`, so it can never be mistaken for a measurement.

use crate::summarizer::simulated_band_powers;
use crate::types::{Band, RecordParts, SignalRecord, SourceKind};
use rand::Rng;
use std::path::Path;

pub const FALLBACK_SAMPLE_RATE: f64 = 256.0;
pub const FALLBACK_CHANNELS: (usize, usize) = (32, 64);
pub const FALLBACK_DURATION_SECONDS: (f64, f64) = (60.0, 360.0);
pub const FALLBACK_QUALITY_RANGE: (f64, f64) = (85.0, 100.0);

pub const FALLBACK_METHOD: &str = "simulated fallback";

pub fn fallback_channel_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("EEG {:03}", i)).collect()
}

/// Build a simulated record for `path`, recording why decoding was abandoned.
pub fn synthesize<R: Rng + ?Sized>(path: &Path, reason: &str, rng: &mut R) -> SignalRecord {
    let (min_ch, max_ch) = FALLBACK_CHANNELS;
    let num_channels = rng.random_range(min_ch..=max_ch);

    let (min_dur, max_dur) = FALLBACK_DURATION_SECONDS;
    let duration = rng.random_range(min_dur..=max_dur);
    let sample_count = (duration * FALLBACK_SAMPLE_RATE).round() as usize;

    let band_powers = simulated_band_powers(rng);

    let (min_q, max_q) = FALLBACK_QUALITY_RANGE;
    let quality_score = rng.random_range(min_q..=max_q);

    // All values are drawn from positive, finite ranges
    SignalRecord::assemble(RecordParts {
        file_path: path.display().to_string(),
        source_kind: SourceKind::FallbackSimulated,
        processing_method: FALLBACK_METHOD.to_string(),
        sampling_rate_hz: FALLBACK_SAMPLE_RATE,
        channel_names: fallback_channel_names(num_channels),
        sample_count,
        band_powers,
        simulated_bands: Band::ALL.to_vec(),
        quality_score,
        fallback_reason: Some(reason.to_string()),
    })
}
