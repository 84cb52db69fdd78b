//! Error types surfaced by the wrapper.

use crate::imaging::LibraryError;
use thiserror::Error;

/// Result type alias for wrapper operations.
pub type Result<T> = std::result::Result<T, BinMagickError>;

#[derive(Error, Debug)]
pub enum BinMagickError {
    /// The handle was released by the library before it could be wrapped.
    #[error("Destroyed image")]
    DestroyedImage,

    /// Reading an image from disk failed; carries the library's message.
    #[error("Error occurred while reading image from file: {0}")]
    Io(String),

    /// Neither the wrapper nor the wrapped handle implements the operation.
    #[error("undefined operation '{0}' for image")]
    UnsupportedOperation(String),

    #[error("invalid argument for '{operation}': {message}")]
    InvalidArgument { operation: String, message: String },

    /// Binarization changed the extent of the working copy.
    #[error(
        "binarized copy is {binary_width}x{binary_height} but the source is {width}x{height}"
    )]
    ExtentMismatch {
        width: u32,
        height: u32,
        binary_width: u32,
        binary_height: u32,
    },

    #[error(transparent)]
    Library(#[from] LibraryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_library_message() {
        let err = BinMagickError::Io("No such file or directory (os error 2)".into());
        assert_eq!(
            err.to_string(),
            "Error occurred while reading image from file: No such file or directory (os error 2)"
        );
    }

    #[test]
    fn library_errors_pass_through_transparently() {
        let err: BinMagickError = LibraryError::Destroyed.into();
        assert_eq!(err.to_string(), "Image has been destroyed");
    }
}
