pub mod analyze;
pub mod batch;
pub mod formats;
pub mod validate;
