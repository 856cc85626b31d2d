//! Human-in-the-loop approval sessions

pub mod controller;
pub mod transport;

pub use controller::*;
pub use transport::*;
