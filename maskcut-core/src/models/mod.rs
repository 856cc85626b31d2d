//! Data models for masking jobs, previews, audit records, and configuration

pub mod audit;
pub mod configuration;
pub mod job;
pub mod masking;

pub use audit::*;
pub use configuration::*;
pub use job::*;
pub use masking::*;
