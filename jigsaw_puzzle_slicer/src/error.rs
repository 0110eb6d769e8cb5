//! Error types shared by every stage of the slicer.

use std::io;
use std::path::PathBuf;

use image::ImageError;
use thiserror::Error;

/// Result type for puzzle operations.
pub type Result<T> = std::result::Result<T, PuzzleError>;

/// Errors raised while building, writing, loading or querying a puzzle.
#[derive(Error, Debug)]
pub enum PuzzleError {
    /// A source image or a required on-disk artifact does not exist
    #[error("input not found: {}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are present but are not a recognised or valid image
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Directory creation, file open, write or flush failed
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// PNG encoding of a piece or of the source image failed
    #[error("failed to encode image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    /// The metadata descriptor is missing, unreadable or semantically invalid
    #[error("invalid puzzle metadata {}: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("no piece with row {row} and col {col}")]
    PieceNotFound { row: u32, col: u32 },

    /// The metadata descriptor could not be encoded or decoded as JSON
    #[error("failed to (de)serialize puzzle metadata {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An image on disk does not have the size the metadata implies
    #[error(
        "unexpected dimensions for {}: expected at least {}x{}, got {}x{}",
        .path.display(), .expected.0, .expected.1, .actual.0, .actual.1
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Attaches the grid coordinates of the piece being handled
    #[error("row: {row} col: {col}: {source}")]
    Piece {
        row: u32,
        col: u32,
        #[source]
        source: Box<PuzzleError>,
    },
}

/// The flat category of a [`PuzzleError`], ignoring any attached context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputNotFound,
    Decode,
    InvalidArgument,
    Io,
    Metadata,
    PieceNotFound,
    Serialization,
}

impl PuzzleError {
    /// Returns the category of this error, looking through [`PuzzleError::Piece`] wrappers.
    ///
    /// Encode failures count as I/O, dimension mismatches as metadata inconsistencies.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PuzzleError::InputNotFound { .. } => ErrorKind::InputNotFound,
            PuzzleError::Decode { .. } => ErrorKind::Decode,
            PuzzleError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            PuzzleError::Io { .. } | PuzzleError::Encode { .. } => ErrorKind::Io,
            PuzzleError::Metadata { .. } | PuzzleError::DimensionMismatch { .. } => {
                ErrorKind::Metadata
            }
            PuzzleError::PieceNotFound { .. } => ErrorKind::PieceNotFound,
            PuzzleError::Serialization { .. } => ErrorKind::Serialization,
            PuzzleError::Piece { source, .. } => source.kind(),
        }
    }

    /// Wraps `self` with the coordinates of the piece it concerns
    pub fn at_piece(self, row: u32, col: u32) -> Self {
        PuzzleError::Piece {
            row,
            col,
            source: Box::new(self),
        }
    }

    /// Returns the (row, col) attached to this error, if any
    pub fn piece_coordinates(&self) -> Option<(u32, u32)> {
        match self {
            PuzzleError::Piece { row, col, .. } | PuzzleError::PieceNotFound { row, col } => {
                Some((*row, *col))
            }
            _ => None,
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PuzzleError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
