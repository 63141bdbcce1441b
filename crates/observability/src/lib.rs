//! Process-wide tracing setup shared by the galley binaries.

pub mod subscriber;

pub use subscriber::{LogFormat, init, init_with};
