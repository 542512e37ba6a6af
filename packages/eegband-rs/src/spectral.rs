//! Welch power spectral density estimation
//!
//! Segment-averaged periodogram: the signal is cut into overlapping segments,
//! each segment is mean-detrended and Hann-windowed, and the squared FFT
//! magnitudes are averaged. Scaling is one-sided density (units²/Hz).

use crate::error::{EegError, Result};
use crate::types::Band;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchConfig {
    /// Samples per segment; clamped to the signal length
    pub segment_len: usize,
    /// Fraction of each segment shared with the next, in [0, 1)
    pub overlap: f64,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            segment_len: 256,
            overlap: 0.5,
        }
    }
}

impl WelchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segment_len < 2 {
            return Err(EegError::InvalidParameter(format!(
                "Welch segment length must be at least 2, got {}",
                self.segment_len
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(EegError::InvalidParameter(format!(
                "Welch overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }
        Ok(())
    }
}

/// One-sided power spectral density
#[derive(Debug, Clone, PartialEq)]
pub struct Psd {
    pub frequencies: Vec<f64>,
    pub density: Vec<f64>,
}

impl Psd {
    /// Keep only bins with `low <= f <= high`
    pub fn restrict(&self, low: f64, high: f64) -> Psd {
        let (frequencies, density) = self
            .frequencies
            .iter()
            .zip(&self.density)
            .filter(|(&f, _)| f >= low && f <= high)
            .map(|(&f, &p)| (f, p))
            .unzip();
        Psd {
            frequencies,
            density,
        }
    }

    /// Mean density over the bins inside `band`, or None if no bin falls in it
    pub fn band_mean(&self, band: Band) -> Option<f64> {
        let (sum, count) = self
            .frequencies
            .iter()
            .zip(&self.density)
            .filter(|(&f, _)| band.contains(f))
            .fold((0.0, 0usize), |(sum, count), (_, &p)| (sum + p, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }
}

/// Element-wise mean of PSDs computed with identical parameters
pub fn average_psd(psds: &[Psd]) -> Result<Psd> {
    let first = psds
        .first()
        .ok_or_else(|| EegError::Spectral("no spectra to average".to_string()))?;

    let mut density = vec![0.0; first.density.len()];
    for psd in psds {
        if psd.density.len() != density.len() {
            return Err(EegError::Spectral(format!(
                "cannot average spectra of {} and {} bins",
                density.len(),
                psd.density.len()
            )));
        }
        for (acc, &p) in density.iter_mut().zip(&psd.density) {
            *acc += p;
        }
    }
    let scale = 1.0 / psds.len() as f64;
    density.iter_mut().for_each(|p| *p *= scale);

    Ok(Psd {
        frequencies: first.frequencies.clone(),
        density,
    })
}

/// Periodic Hann window, as used for spectral estimation
fn hann_window(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

/// Estimate the PSD of `signal` sampled at `sample_rate` Hz
pub fn welch_psd(signal: &[f64], sample_rate: f64, config: &WelchConfig) -> Result<Psd> {
    config.validate()?;

    if signal.len() < 2 {
        return Err(EegError::Spectral(format!(
            "need at least 2 samples, got {}",
            signal.len()
        )));
    }
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(EegError::Spectral(format!(
            "invalid sample rate {}",
            sample_rate
        )));
    }
    if signal.iter().any(|x| !x.is_finite()) {
        return Err(EegError::Spectral(
            "signal contains non-finite samples".to_string(),
        ));
    }

    let seg_len = config.segment_len.min(signal.len());
    let overlap = (seg_len as f64 * config.overlap).floor() as usize;
    let step = (seg_len - overlap).max(1);

    let window = hann_window(seg_len);
    let window_power: f64 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(seg_len);

    let num_bins = seg_len / 2 + 1;
    let mut accum = vec![0.0; num_bins];
    let mut buffer = vec![Complex::new(0.0, 0.0); seg_len];
    let mut num_segments = 0usize;

    let mut start = 0;
    while start + seg_len <= signal.len() {
        let segment = &signal[start..start + seg_len];
        let mean = segment.iter().sum::<f64>() / seg_len as f64;

        for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
            *slot = Complex::new((x - mean) * w, 0.0);
        }
        fft.process(&mut buffer);

        for (acc, c) in accum.iter_mut().zip(&buffer[..num_bins]) {
            *acc += c.norm_sqr();
        }
        num_segments += 1;
        start += step;
    }

    let scale = 1.0 / (sample_rate * window_power * num_segments as f64);
    let nyquist_bin = (seg_len % 2 == 0).then_some(seg_len / 2);
    let density: Vec<f64> = accum
        .iter()
        .enumerate()
        .map(|(k, &p)| {
            // One-sided: fold negative frequencies onto positive ones
            if k == 0 || Some(k) == nyquist_bin {
                p * scale
            } else {
                2.0 * p * scale
            }
        })
        .collect();

    let frequencies = (0..num_bins)
        .map(|k| k as f64 * sample_rate / seg_len as f64)
        .collect();

    log::trace!(
        "Welch PSD: {} segments of {} samples, {} bins",
        num_segments,
        seg_len,
        num_bins
    );

    Ok(Psd {
        frequencies,
        density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_sine_peak_location() {
        let psd = welch_psd(&sine(10.0, 256.0, 2048), 256.0, &WelchConfig::default()).unwrap();
        assert_eq!(psd.frequencies.len(), 129);
        assert_eq!(psd.resolution(), 1.0);

        let peak = psd
            .density
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| psd.frequencies[k])
            .unwrap();
        assert_eq!(peak, 10.0);
    }

    #[test]
    fn test_parseval_for_unit_sine() {
        // Total power of a unit-amplitude sine is 1/2
        let psd = welch_psd(&sine(32.0, 256.0, 4096), 256.0, &WelchConfig::default()).unwrap();
        let total: f64 = psd.density.iter().sum::<f64>() * psd.resolution();
        assert!((total - 0.5).abs() < 0.02, "total power {}", total);
    }

    #[test]
    fn test_density_non_negative() {
        let signal: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 113) as f64 - 56.0).collect();
        let psd = welch_psd(&signal, 200.0, &WelchConfig::default()).unwrap();
        assert!(psd.density.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_short_signal_uses_whole_length() {
        let psd = welch_psd(&sine(10.0, 256.0, 64), 256.0, &WelchConfig::default()).unwrap();
        assert_eq!(psd.frequencies.len(), 33);
        assert_eq!(psd.resolution(), 4.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        let config = WelchConfig::default();
        assert!(welch_psd(&[1.0], 256.0, &config).is_err());
        assert!(welch_psd(&[1.0, f64::NAN, 2.0], 256.0, &config).is_err());
        assert!(welch_psd(&[1.0, 2.0], 0.0, &config).is_err());

        let bad = WelchConfig {
            segment_len: 64,
            overlap: 1.0,
        };
        assert!(welch_psd(&sine(10.0, 256.0, 128), 256.0, &bad).is_err());
    }

    #[test]
    fn test_band_mean_and_restrict() {
        let psd = Psd {
            frequencies: vec![0.0, 2.0, 4.0, 6.0, 10.0, 120.0],
            density: vec![9.0, 1.0, 2.0, 4.0, 8.0, 7.0],
        };
        let restricted = psd.restrict(0.5, 100.0);
        assert_eq!(restricted.frequencies, vec![2.0, 4.0, 6.0, 10.0]);

        assert_eq!(restricted.band_mean(Band::Delta), Some(1.0));
        assert_eq!(restricted.band_mean(Band::Theta), Some(3.0));
        assert_eq!(restricted.band_mean(Band::Alpha), Some(8.0));
        assert_eq!(restricted.band_mean(Band::Gamma), None);
    }

    #[test]
    fn test_average_psd() {
        let a = Psd {
            frequencies: vec![0.0, 1.0],
            density: vec![1.0, 3.0],
        };
        let b = Psd {
            frequencies: vec![0.0, 1.0],
            density: vec![3.0, 5.0],
        };
        assert_eq!(average_psd(&[a, b]).unwrap().density, vec![2.0, 4.0]);
        assert!(average_psd(&[]).is_err());
    }
}
