//! Masking job orchestration module

pub mod job_queue;
pub mod orchestrator;
pub mod status;

pub use job_queue::*;
pub use orchestrator::*;
pub use status::*;
