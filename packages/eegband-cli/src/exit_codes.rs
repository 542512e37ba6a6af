use eegband_rs::EegError;

pub const SUCCESS: i32 = 0;
/// Missing, unreadable or unsupported input, or bad arguments
pub const INPUT_ERROR: i32 = 1;
pub const EXECUTION_ERROR: i32 = 2;
/// Batch finished with at least one success and one failure
pub const PARTIAL_FAILURE: i32 = 3;

/// Exit code for an error surfaced by a strict analysis
pub fn for_error(err: &EegError) -> i32 {
    match err {
        EegError::FileNotFound(_)
        | EegError::UnsupportedFormat(_)
        | EegError::Decode(_)
        | EegError::InvalidParameter(_) => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}
