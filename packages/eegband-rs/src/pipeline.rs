use crate::backend::SpectralBackend;
use crate::config::PipelineConfig;
use crate::error::{EegError, Result};
use crate::fallback;
use crate::format::FileFormat;
use crate::quality::quality_score;
use crate::summarizer::{summarize, BandSummary};
use crate::text_reader::read_text_signal;
use crate::types::{DecodedSignal, RecordParts, SignalRecord, SourceKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// EEG band summarization pipeline
///
/// Holds immutable configuration and the spectral backend chosen at
/// construction; every call is independent, so one pipeline can be shared
/// across threads.
#[derive(Clone)]
pub struct SignalPipeline {
    config: PipelineConfig,
    backend: Arc<dyn SpectralBackend>,
}

impl std::fmt::Debug for SignalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalPipeline")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl SignalPipeline {
    /// Create a pipeline using the backend named in `config`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let backend = config.backend.build();
        Self::with_backend(config, backend)
    }

    /// Create a pipeline with a caller-supplied backend
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration; `config.backend` is ignored
    /// * `backend` - Decoder and PSD estimator to use for every call
    pub fn with_backend(config: PipelineConfig, backend: Arc<dyn SpectralBackend>) -> Result<Self> {
        config.validate()?;
        log::debug!("Pipeline ready with {} backend", backend.name());
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Fresh generator per call, reseeded each time when a seed is configured
    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Dispatch on the file extension and decode into a signal matrix
    pub fn decode<P: AsRef<Path>>(&self, path: P) -> Result<DecodedSignal> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EegError::FileNotFound(path.display().to_string()));
        }

        let format = FileFormat::from_path(path)?;
        log::debug!("Dispatching {} as {}", path.display(), format.label());

        let signal = if format.is_native() {
            self.backend.decode_native(path, format)?
        } else {
            read_text_signal(path, self.config.text_sample_rate_hz)?
        };

        let (channels, samples) = signal.shape();
        if channels == 0 || samples == 0 {
            return Err(EegError::Decode(format!(
                "{} decoded to an empty {}x{} matrix",
                path.display(),
                channels,
                samples
            )));
        }
        Ok(signal)
    }

    /// Strict entry point: decoding errors are returned, not replaced.
    /// Band and quality substitutions still happen and are tagged on the record.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<SignalRecord> {
        let path = path.as_ref();
        let start_time = std::time::Instant::now();
        log::info!("Analyzing {}", path.display());

        let signal = self.decode(path)?;
        let (channels, samples) = signal.shape();
        log::info!(
            "Decoded {} channels x {} samples at {} Hz",
            channels,
            samples,
            signal.sample_rate
        );

        let quality = quality_score(&signal.data);
        let mut rng = self.rng();
        let summary = summarize(
            &signal,
            self.backend.as_ref(),
            &self.config.welch,
            self.config.psd_range_hz,
            &mut rng,
        );
        let processing_method = describe_method(&signal, &summary);

        let record = SignalRecord::new(RecordParts {
            file_path: path.display().to_string(),
            source_kind: SourceKind::from(signal.format),
            processing_method,
            sampling_rate_hz: signal.sample_rate,
            channel_names: signal.channel_names,
            sample_count: samples,
            band_powers: summary.powers,
            simulated_bands: summary.simulated,
            quality_score: quality,
            fallback_reason: None,
        })?;

        log::info!(
            "Summarized {} in {:.3}s",
            path.display(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(record)
    }

    /// Guarded entry point: always returns a record. Any decoding failure is
    /// logged and replaced by a simulated record carrying the reason.
    pub fn process<P: AsRef<Path>>(&self, path: P) -> SignalRecord {
        let path = path.as_ref();
        match self.analyze(path) {
            Ok(record) => record,
            Err(e) => self.fallback(path, &e.to_string()),
        }
    }

    /// `process` or `analyze`, depending on `simulate_on_failure`
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<SignalRecord> {
        if self.config.simulate_on_failure {
            Ok(self.process(path))
        } else {
            self.analyze(path)
        }
    }

    /// Run `process` on the blocking thread pool
    pub async fn process_async(&self, path: PathBuf) -> SignalRecord {
        let pipeline = self.clone();
        let task_path = path.clone();
        match tokio::task::spawn_blocking(move || pipeline.process(&task_path)).await {
            Ok(record) => record,
            Err(e) => self.fallback(&path, &format!("processing task failed: {}", e)),
        }
    }

    /// Process every path independently and in parallel, preserving order
    pub fn process_many<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<SignalRecord> {
        paths.par_iter().map(|path| self.process(path)).collect()
    }

    fn fallback(&self, path: &Path, reason: &str) -> SignalRecord {
        log::warn!(
            "Falling back to simulated record for {}: {}",
            path.display(),
            reason
        );
        fallback::synthesize(path, reason, &mut self.rng())
    }
}

fn describe_method(signal: &DecodedSignal, summary: &BandSummary) -> String {
    match &summary.spectral_error {
        Some(err) => format!("{}; bands simulated ({})", signal.processing_method, err),
        None if summary.simulated.is_empty() => {
            format!("{}; Welch PSD", signal.processing_method)
        }
        None => format!(
            "{}; Welch PSD, {} band(s) without frequency bins",
            signal.processing_method,
            summary.simulated.len()
        ),
    }
}
