//! # Maskcut Core Library
//!
//! Masking job orchestration: a single-worker FIFO scheduler, a per-job
//! mask → approve → relay loop with an edit/retry cycle, approval-session
//! lifecycle management, a bounded status broadcast log, and privacy-safe
//! audit recording. Networking, prompts, and UI live behind the collaborator
//! traits in `client`, `approval`, `relay`, and `audit`.

pub mod approval;
pub mod audit;
pub mod client;
pub mod errors;
pub mod models;
pub mod relay;
pub mod services;
pub mod workflow;
