pub mod backend;
pub mod config;
pub mod edf;
pub mod error;
pub mod fallback;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod quality;
pub mod spectral;
pub mod summarizer;
pub mod text_reader;
pub mod types;

pub use backend::{BackendKind, NativeBackend, SpectralBackend, UnavailableBackend};
pub use config::PipelineConfig;
pub use error::{EegError, Result};
pub use format::FileFormat;
pub use pipeline::SignalPipeline;
pub use spectral::{Psd, WelchConfig};
pub use types::*;
