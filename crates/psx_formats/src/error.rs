//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// data at the offset does not carry the expected signature
    #[error("expected a {format} signature at offset {offset:#X}")]
    SignatureMismatch { format: &'static str, offset: usize },

    /// TMD uses absolute addresses instead of offsets
    #[error("TMD at offset {0:#X} uses absolute addresses")]
    AbsoluteAddresses(usize),

    /// TMD has an empty object table
    #[error("TMD at offset {0:#X} has no objects")]
    NoObjects(usize),

    /// A computed length runs past the end of the data
    #[error("{format} at offset {offset:#X} claims {length} bytes but only {available} remain")]
    OutOfBounds {
        format: &'static str,
        offset: usize,
        length: usize,
        available: usize,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
