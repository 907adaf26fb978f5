//! Error types.

use thiserror::Error;

/// Errors returned by clustering and quantization.
#[derive(Debug, Error)]
pub enum Error {
    /// The input or configuration violates a precondition of the run.
    ///
    /// Raised before any iteration starts; a run never returns a partial result.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Decoding or encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The worker thread pool could not be configured.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! invalid_argument {
    ($($arg:tt)*) => {
        $crate::error::Error::InvalidArgument(format!($($arg)*))
    };
}

pub(crate) use invalid_argument;
