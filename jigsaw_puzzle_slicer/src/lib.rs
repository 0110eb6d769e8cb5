//! The Jigsaw Puzzle Slicer cuts a rectangular image into a grid of square pieces, stores them in
//! a directory and loads them back. It provides three entry points:
//!
//! - [`build_from_file`] decodes an image (PNG, JPEG, ...) and cuts it into pieces. This is the
//!     function you normally want to use
//! - [`write_to_directory`] persists a puzzle as `original_image.png`, `puzzle.json` and one
//!     `<row>/<col>.png` per piece
//! - [`load_from_directory`] rebuilds a puzzle from such a directory
//!
//! Pieces are plain `piece_size` squares. Pixels past the last full row or column are dropped.

use std::path::Path;

mod error;
mod loader;
mod puzzle;
mod storage;

pub use error::{ErrorKind, PuzzleError, Result};
pub use loader::load_rgba_image;
pub use puzzle::{grid_dimensions, Piece, Puzzle, PuzzleGenerator};
pub use storage::{piece_path, read_metadata, PuzzleMetadata, METADATA_FILE, ORIGINAL_IMAGE_FILE};

pub use image;

/// Decodes the image at `input_path` and cuts it into `piece_size` squares
pub fn build_from_file(input_path: impl AsRef<Path>, piece_size: u32) -> Result<Puzzle> {
    PuzzleGenerator::from_path(input_path, piece_size)?.generate()
}

/// Writes `puzzle` into `output_dir`, creating the directory if needed
pub fn write_to_directory(puzzle: &Puzzle, output_dir: impl AsRef<Path>) -> Result<()> {
    puzzle.write_to_directory(output_dir)
}

/// Loads the puzzle stored in `input_dir`
pub fn load_from_directory(input_dir: impl AsRef<Path>) -> Result<Puzzle> {
    Puzzle::from_directory(input_dir)
}
