// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod cache;
pub mod logging;
pub mod types;

pub use cache::*;
pub use logging::*;
pub use types::*;
