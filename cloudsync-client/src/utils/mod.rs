//! Tool module

pub mod log_sanitizer;
pub mod serde_id;
