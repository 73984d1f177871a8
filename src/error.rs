//! Error handling.
//!
//! Two kinds of errors exist. A [`DriverError`] ends the job: the output sink failed
//! or the driver was used out of order. An [`OpError`] only affects a single drawing
//! operation; the page keeps rendering and the error is collected into the page's
//! error list and the job [`Report`](crate::report::Report).

use thiserror::Error;

use crate::driver::JobStage;
use crate::image::PixelFormat;

/// A wrapper type for fatal driver errors.
pub type DriverResult<T> = Result<T, DriverError>;

/// A wrapper type for recoverable per-operation errors.
pub type OpResult<T> = Result<T, OpError>;

/// A fatal error that aborts the job.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Writing to the output sink failed.
    #[error("failed to write to the output sink: {0}")]
    Io(#[from] std::io::Error),
    /// An operation was called in a stage of the job where it isn't allowed.
    #[error("`{operation}` is not allowed while the job is {stage:?}")]
    Stage {
        /// The name of the rejected operation.
        operation: &'static str,
        /// The stage the job was in.
        stage: JobStage,
    },
}

/// An error that only affects a single drawing operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// A state was popped without a matching push.
    #[error("graphics state stack underflow")]
    StackUnderflow,
    /// Pixels were drawn while a clip path was being collected.
    #[error("drawing pixels while clipping is not supported")]
    PixelsInClip,
    /// Clipping to the inverse of a picture was requested.
    #[error("clipping to an inverse picture is not supported")]
    InverseClip,
    /// A clip-to-picture was started while another one is collected.
    #[error("nested clipping to a picture is not supported")]
    NestedClip,
    /// A pixel buffer is smaller than its declared geometry.
    #[error("pixel buffer too small for a {width}x{height} {format:?} image")]
    PixelBuffer {
        /// The declared pixel format.
        format: PixelFormat,
        /// The width in pixels.
        width: u32,
        /// The height in pixels.
        height: u32,
    },
    /// A pattern wasn't collected before it was used.
    #[error("pattern missing, falling back to the high color")]
    MissingPattern,
    /// A font couldn't be used.
    #[error("font error: {0}")]
    Font(String),
}

/// A bookmark or cross reference definition file couldn't be used.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The file couldn't be read.
    #[error("could not read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    /// The file isn't valid JSON of the expected shape.
    #[error("could not parse {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}

impl DefinitionError {
    /// Whether the file doesn't exist, as opposed to being unreadable or malformed.
    pub fn is_missing(&self) -> bool {
        matches!(self, DefinitionError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
