//! Error types that can be emitted from this library

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::tree::NodeId;

/// How far an error reaches.
///
/// A recoverable error aborts only the operation that raised it; the tree is
/// left as it was. A fatal error means a container could not be decomposed or
/// rebuilt and the load or save it belongs to has to be abandoned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`psx_formats::error::Error`]
    #[error(transparent)]
    FormatError(#[from] psx_formats::error::Error),

    /// size-less container member has no recognised signature
    #[error("no known signature at offset {offset:#X} of {container}")]
    #[diagnostic(help("the container cannot be split without guessing a member length"))]
    UnsplittableMember { container: String, offset: usize },

    /// sound bank header or body has no data
    #[error("sound bank at offset {offset:#X} has an empty {part}")]
    EmptySoundBank { offset: usize, part: &'static str },

    /// a member length runs past the end of its container
    #[error("member at offset {offset:#X} claims {length} bytes but only {available} remain")]
    TruncatedMember {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// sector index refers to a member that does not exist
    #[error("nominal index {nominal} points at missing member {index}")]
    MissingNominalIndex { nominal: usize, index: usize },

    /// sector index table does not fit its single header sector
    #[error("sector index table needs {0} bytes, more than one sector")]
    SectorTableOverflow(usize),

    /// a member starts beyond the last addressable sector
    #[error("sector {0} cannot be addressed by a 16 bit index")]
    SectorOutOfRange(usize),

    /// arena handle no longer refers to a node
    #[error("node {0} is not part of the tree")]
    StaleNode(NodeId),

    /// requested path does not exist in the tree
    #[error("no node at {0}")]
    PathNotFound(String),

    /// parent of a new manifest record does not exist
    #[error("parent of {0} is not in the tree")]
    MissingParent(String),

    /// a sibling with the same name already exists
    #[error("{0} already exists")]
    DuplicateName(String),

    /// operation needs a container but got something else
    #[error("{0} is not a container")]
    NotAContainer(String),

    /// new nodes can only be added below folders and the root
    #[error("{0} cannot hold new files")]
    NotAFolder(String),

    /// operation needs a leaf with bytes of its own
    #[error("{0} has no data of its own")]
    NotALeaf(String),

    /// the game directory would be written over
    #[error("refusing to overwrite the source directory {}", .0.display())]
    #[diagnostic(help("pass the overwrite option to allow writing into the source directory"))]
    WouldOverwriteSource(PathBuf),

    /// manifest for an identified game is missing
    #[error("manifest {} could not be read", .0.display())]
    MissingManifest(PathBuf),

    /// manifest declares an unsupported major version
    #[error("unsupported manifest version {major}.{minor}")]
    UnsupportedManifestVersion { major: u32, minor: u32 },

    /// manifest line could not be parsed
    #[error("manifest line {line}: {message}")]
    InvalidManifestLine { line: usize, message: String },

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::UnsplittableMember { .. }
            | Error::EmptySoundBank { .. }
            | Error::TruncatedMember { .. }
            | Error::MissingNominalIndex { .. }
            | Error::SectorTableOverflow(_)
            | Error::SectorOutOfRange(_)
            | Error::StaleNode(_)
            | Error::FormatError(_) => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
