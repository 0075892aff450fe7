//! Ambient support crate: error type, numeric casts, disk/filesystem helpers
//! and run timing, shared between the `geo` resampling engine and the `map`
//! command-line tool.

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod cast;
pub mod duration;
mod error;
pub mod fs;
pub mod warnonce;
