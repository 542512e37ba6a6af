/// Spectral band summarizer
///
/// Turns a decoded signal into five band powers. Bands that cannot be
/// measured are substituted and reported in `simulated`.
use crate::backend::SpectralBackend;
use crate::spectral::{average_psd, Psd, WelchConfig};
use crate::types::{Band, BandPowers, DecodedSignal};
use crate::error::Result;
use rand::Rng;
use rayon::prelude::*;

/// Mean PSD values are reported as percentage-like scores
pub const POWER_SCALE: f64 = 100.0;

/// Value for a band whose window holds no frequency bin
pub const UNRESOLVED_BAND_POWER: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct BandSummary {
    pub powers: BandPowers,
    pub simulated: Vec<Band>,
    /// Set when the whole spectrum could not be estimated
    pub spectral_error: Option<String>,
}

pub fn simulated_band_value<R: Rng + ?Sized>(band: Band, rng: &mut R) -> f64 {
    let (low, high) = band.fallback_range();
    rng.random_range(low..=high)
}

pub fn simulated_band_powers<R: Rng + ?Sized>(rng: &mut R) -> BandPowers {
    let mut powers = BandPowers::default();
    for band in Band::ALL {
        powers.set(band, simulated_band_value(band, rng));
    }
    powers
}

/// Mean PSD per band window, scaled. Empty windows get the fixed default,
/// non-finite results a simulated value.
pub fn band_powers_from_psd<R: Rng + ?Sized>(psd: &Psd, rng: &mut R) -> BandSummary {
    let mut powers = BandPowers::default();
    let mut simulated = Vec::new();

    for band in Band::ALL {
        let value = match psd.band_mean(band) {
            None => {
                log::debug!(
                    "No frequency bin inside {} at {:.3} Hz resolution",
                    band,
                    psd.resolution()
                );
                simulated.push(band);
                UNRESOLVED_BAND_POWER
            }
            Some(mean) if mean.is_finite() && mean >= 0.0 => mean * POWER_SCALE,
            Some(mean) => {
                log::warn!("Band {} produced invalid power {}, substituting", band, mean);
                simulated.push(band);
                simulated_band_value(band, rng)
            }
        };
        powers.set(band, value);
    }

    BandSummary {
        powers,
        simulated,
        spectral_error: None,
    }
}

/// PSD for the whole recording: per-channel average for native files, the PSD
/// of the channel-mean waveform for text files.
fn recording_psd(
    signal: &DecodedSignal,
    backend: &dyn SpectralBackend,
    welch: &WelchConfig,
) -> Result<Psd> {
    if signal.format.is_native() {
        let psds = signal
            .data
            .par_iter()
            .map(|channel| backend.welch_psd(channel, signal.sample_rate, welch))
            .collect::<Result<Vec<Psd>>>()?;
        average_psd(&psds)
    } else {
        backend.welch_psd(&signal.mean_waveform(), signal.sample_rate, welch)
    }
}

pub fn summarize<R: Rng + ?Sized>(
    signal: &DecodedSignal,
    backend: &dyn SpectralBackend,
    welch: &WelchConfig,
    psd_range_hz: (f64, f64),
    rng: &mut R,
) -> BandSummary {
    match recording_psd(signal, backend, welch) {
        Ok(psd) => {
            let (low, high) = psd_range_hz;
            band_powers_from_psd(&psd.restrict(low, high), rng)
        }
        Err(e) => {
            log::warn!(
                "Spectral estimation failed via {} backend ({}), simulating all bands",
                backend.name(),
                e
            );
            BandSummary {
                powers: simulated_band_powers(rng),
                simulated: Band::ALL.to_vec(),
                spectral_error: Some(e.to_string()),
            }
        }
    }
}
