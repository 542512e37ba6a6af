use log::LevelFilter;

/// Map a `-v` repeat count to a log level (warnings are always shown)
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install `env_logger` at `level`. Safe to call more than once; returns
/// false if a logger was already installed.
pub fn init(level: LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .try_init()
        .is_ok()
}
