use crate::cli::PipelineArgs;
use eegband_rs::{BackendKind, PipelineConfig, SignalPipeline, WelchConfig};

/// Merge the optional config file with command-line overrides
pub fn build_config(args: &PipelineArgs) -> Result<PipelineConfig, String> {
    let mut config = match args.config {
        Some(ref path) => PipelineConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };

    if let Some(rate) = args.sample_rate {
        config = config.with_text_sample_rate(rate);
    }
    if let Some(segment_len) = args.segment_len {
        let welch = WelchConfig {
            segment_len,
            ..config.welch
        };
        config = config.with_welch(welch);
    }
    if args.seed.is_some() {
        config = config.with_seed(args.seed);
    }
    if args.no_spectral {
        config = config.with_backend(BackendKind::Unavailable);
    }
    if args.strict {
        config = config.with_simulate_on_failure(false);
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub fn build_pipeline(args: &PipelineArgs) -> Result<SignalPipeline, String> {
    let config = build_config(args)?;
    log::debug!("Pipeline config: {:?}", config);
    SignalPipeline::new(config).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = build_config(&PipelineArgs::default()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = PipelineArgs {
            sample_rate: Some(512.0),
            seed: Some(3),
            segment_len: Some(128),
            no_spectral: true,
            strict: true,
            config: None,
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.text_sample_rate_hz, 512.0);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.welch.segment_len, 128);
        assert_eq!(config.welch.overlap, 0.5);
        assert_eq!(config.backend, BackendKind::Unavailable);
        assert!(!config.simulate_on_failure);
    }

    #[test]
    fn test_invalid_sample_rate() {
        let args = PipelineArgs {
            sample_rate: Some(-5.0),
            ..Default::default()
        };
        let err = build_config(&args).unwrap_err();
        assert!(err.contains("sample rate"));
    }

    #[test]
    fn test_invalid_segment_len() {
        let args = PipelineArgs {
            segment_len: Some(0),
            ..Default::default()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_config_file_then_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"text_sample_rate_hz": 100.0, "seed": 9}}"#).unwrap();
        file.flush().unwrap();

        let args = PipelineArgs {
            sample_rate: Some(200.0),
            config: Some(file.path().to_str().unwrap().to_string()),
            ..Default::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.text_sample_rate_hz, 200.0);
        assert_eq!(config.seed, Some(9));
    }
}
