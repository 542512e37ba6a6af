use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "eegband",
    version,
    about = "EEG spectral band summarization tool",
    long_about = "Summarize EEG recordings (EDF, BDF, CSV/TXT/DAT) into delta, theta, alpha,\n\
                  beta and gamma band powers plus a signal quality score.\n\
                  Unreadable inputs yield simulated records tagged fallback-simulated\n\
                  unless --strict is given."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize one recording
    Analyze(AnalyzeArgs),
    /// Summarize many recordings in parallel
    Batch(BatchArgs),
    /// Check that a file exists and has a supported format
    Validate(ValidateArgs),
    /// List supported file formats
    Formats(FormatsArgs),
}

/// Options shared by analyze and batch
#[derive(Args, Clone, Debug, Default)]
pub struct PipelineArgs {
    /// Sampling rate assumed for delimited-text files, in Hz [default: 256]
    #[arg(long, env = "EEGBAND_SAMPLE_RATE")]
    pub sample_rate: Option<f64>,

    /// Seed for simulated values, for reproducible output
    #[arg(long, env = "EEGBAND_SEED")]
    pub seed: Option<u64>,

    /// Welch segment length in samples [default: 256]
    #[arg(long, env = "EEGBAND_SEGMENT_LEN")]
    pub segment_len: Option<usize>,

    /// Disable native decoding and spectral estimation
    #[arg(long, default_value_t = false)]
    pub no_spectral: bool,

    /// Fail on unreadable input instead of emitting a simulated record
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// JSON pipeline configuration file
    #[arg(long, env = "EEGBAND_CONFIG")]
    pub config: Option<String>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input recording (EDF, BDF, CSV, TXT, DAT)
    #[arg(long)]
    pub file: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern selecting input files (e.g. "data/*.edf")
    #[arg(long, conflicts_with = "files")]
    pub glob: Option<String>,

    /// Explicit list of input files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    /// Directory for <stem>_bands.json results (default: JSON lines on stdout)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Keep going after a failed file
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Compact JSON in per-file outputs
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input file path
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct FormatsArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
