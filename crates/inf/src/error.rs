use thiserror::Error;

/// Error kinds shared by the `geo` resampling engine and the `map` binary.
///
/// `Config` and `Io` (and `DiskSpace`) are always fatal: the caller reports
/// the message and exits with status 1. `Interpolation` and `OutOfRange`
/// are always local to a single output cell; the engine logs them (subject
/// to [`crate::warnonce::WarnOnce`] rate limiting) and substitutes the
/// configured nodata value rather than aborting the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Not enough free disk space: need {required} bytes, {available} available")]
    DiskSpace { required: u64, available: u64 },
    #[error("Interpolation failed: {0}")]
    Interpolation(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("System I/O error: {0}")]
    StdIo(#[from] std::io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    pub fn interpolation(msg: impl Into<String>) -> Self {
        Error::Interpolation(msg.into())
    }

    /// Exit code this error should produce when surfaced at the CLI boundary.
    /// Every variant that reaches the top level is fatal (local interpolation
    /// failures never propagate this far, see module docs).
    pub fn exit_code(&self) -> i32 {
        1
    }
}
