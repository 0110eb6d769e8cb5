//! On-disk layout of a puzzle:
//!
//! ```text
//! <dir>/
//!   original_image.png
//!   puzzle.json          {"NumRows":..,"NumCols":..,"PieceSize":..}
//!   <row>/
//!     <col>.png
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, Result};
use crate::loader::load_rgba_image;
use crate::puzzle::{Piece, Puzzle};

pub const METADATA_FILE: &str = "puzzle.json";
pub const ORIGINAL_IMAGE_FILE: &str = "original_image.png";

/// The grid geometry persisted next to the pieces. This is what a puzzle is rebuilt from when
/// loading a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleMetadata {
    #[serde(rename = "NumRows")]
    pub rows: u32,
    #[serde(rename = "NumCols")]
    pub columns: u32,
    #[serde(rename = "PieceSize")]
    pub piece_size: u32,
}

/// Path of the piece file at (`row`, `col`) inside a puzzle directory
pub fn piece_path(dir: impl AsRef<Path>, row: u32, col: u32) -> PathBuf {
    dir.as_ref().join(row.to_string()).join(format!("{col}.png"))
}

fn create_dir(path: &Path) -> Result<()> {
    // create_dir_all already treats an existing directory as success
    fs::create_dir_all(path).map_err(|err| PuzzleError::io("create directory", path, err))
}

fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|err| PuzzleError::io("create", path, err))?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|source| PuzzleError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer
        .flush()
        .map_err(|err| PuzzleError::io("flush", path, err))
}

fn write_metadata(metadata: &PuzzleMetadata, path: &Path) -> Result<()> {
    let json = serde_json::to_vec(metadata).map_err(|source| PuzzleError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|err| PuzzleError::io("write", path, err))
}

/// Reads and validates the metadata descriptor at `path`
pub fn read_metadata(path: impl AsRef<Path>) -> Result<PuzzleMetadata> {
    let path = path.as_ref();
    let json = fs::read(path).map_err(|err| PuzzleError::Metadata {
        path: path.to_path_buf(),
        reason: format!("cannot read descriptor: {err}"),
    })?;
    let metadata: PuzzleMetadata =
        serde_json::from_slice(&json).map_err(|source| PuzzleError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    if metadata.piece_size == 0 {
        return Err(PuzzleError::Metadata {
            path: path.to_path_buf(),
            reason: "piece size must be positive".to_string(),
        });
    }
    Ok(metadata)
}

/// Loads the piece at (`row`, `col`) and checks it is a `piece_size` square
fn load_piece(dir: &Path, row: u32, col: u32, piece_size: u32) -> Result<Piece> {
    let path = piece_path(dir, row, col);
    let image = load_rgba_image(&path)?;
    if image.dimensions() != (piece_size, piece_size) {
        return Err(PuzzleError::DimensionMismatch {
            path,
            expected: (piece_size, piece_size),
            actual: image.dimensions(),
        });
    }
    Ok(Piece::new(row, col, image))
}

impl Puzzle {
    /// Writes the source image, the metadata descriptor and one PNG per piece into `output_dir`.
    ///
    /// Existing files are overwritten. The first failure aborts the write; files written before
    /// it are left in place.
    pub fn write_to_directory(&self, output_dir: impl AsRef<Path>) -> Result<()> {
        let output_dir = output_dir.as_ref();
        create_dir(output_dir)?;

        let original_path = output_dir.join(ORIGINAL_IMAGE_FILE);
        match self.image() {
            Some(image) => write_png(image, &original_path)?,
            None => {
                debug!("source image was taken, writing the assembled pieces instead");
                write_png(&self.assemble(), &original_path)?;
            }
        }
        write_metadata(&self.metadata(), &output_dir.join(METADATA_FILE))?;

        // every row directory exists before any piece is written into it
        for row in 0..self.rows() {
            let row_dir = output_dir.join(row.to_string());
            debug!("creating row {row} directory {}", row_dir.display());
            create_dir(&row_dir)?;
        }

        self.pieces().par_iter().try_for_each(|piece| {
            let path = piece_path(output_dir, piece.row, piece.col);
            debug!("writing piece ({}, {}) to {}", piece.row, piece.col, path.display());
            write_png(&piece.image, &path).map_err(|err| err.at_piece(piece.row, piece.col))
        })?;

        info!(
            "wrote {} pieces ({}x{}) to {}",
            self.len(),
            self.rows(),
            self.columns(),
            output_dir.display()
        );
        Ok(())
    }

    /// Rebuilds a puzzle from a directory written by [`Puzzle::write_to_directory`].
    ///
    /// The grid comes from `puzzle.json`; `original_image.png` and every `<row>/<col>.png` it
    /// implies must be present.
    pub fn from_directory(input_dir: impl AsRef<Path>) -> Result<Self> {
        let input_dir = input_dir.as_ref();
        let metadata_path = input_dir.join(METADATA_FILE);
        let metadata = read_metadata(&metadata_path)?;
        debug!(
            "{} rows {} cols, piece size {}",
            metadata.rows, metadata.columns, metadata.piece_size
        );

        let image_path = input_dir.join(ORIGINAL_IMAGE_FILE);
        let image = load_rgba_image(&image_path)?;
        let grid = metadata
            .columns
            .checked_mul(metadata.piece_size)
            .zip(metadata.rows.checked_mul(metadata.piece_size))
            .ok_or_else(|| PuzzleError::Metadata {
                path: metadata_path,
                reason: "grid size overflows".to_string(),
            })?;
        if image.width() < grid.0 || image.height() < grid.1 {
            return Err(PuzzleError::DimensionMismatch {
                path: image_path,
                expected: grid,
                actual: image.dimensions(),
            });
        }

        let columns = metadata.columns as usize;
        let count = metadata.rows as usize * columns;
        let pieces = (0..count)
            .into_par_iter()
            .map(|index| {
                let row = (index / columns) as u32;
                let col = (index % columns) as u32;
                load_piece(input_dir, row, col, metadata.piece_size)
                    .map_err(|err| err.at_piece(row, col))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "loaded {} pieces ({}x{}) from {}",
            pieces.len(),
            metadata.rows,
            metadata.columns,
            input_dir.display()
        );
        Ok(Puzzle::from_parts(image, metadata, pieces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{DynamicImage, Rgb, RgbImage, Rgba};

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 77, (x + y) as u8 | 1])
        })
    }

    fn assert_same_pieces(left: &Puzzle, right: &Puzzle) {
        assert_eq!(left.rows(), right.rows());
        assert_eq!(left.columns(), right.columns());
        assert_eq!(left.piece_size(), right.piece_size());
        assert_eq!(left.len(), right.len());
        for row in 0..left.rows() {
            for col in 0..left.columns() {
                let a = left.get(row, col).unwrap();
                let b = right.get(row, col).unwrap();
                assert_eq!(a.image, b.image, "piece ({row}, {col}) differs");
            }
        }
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = PuzzleMetadata {
            rows: 3,
            columns: 5,
            piece_size: 20,
        };
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"NumRows":3,"NumCols":5,"PieceSize":20}"#
        );
        let parsed: PuzzleMetadata =
            serde_json::from_str(r#"{"PieceSize":20,"NumCols":5,"NumRows":3}"#).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_write_layout_100x60() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("puzzle");
        let puzzle = Puzzle::build(gradient(100, 60), 20).unwrap();
        puzzle.write_to_directory(&out).unwrap();

        assert!(out.join(ORIGINAL_IMAGE_FILE).is_file());
        assert_eq!(
            fs::read_to_string(out.join(METADATA_FILE)).unwrap(),
            r#"{"NumRows":3,"NumCols":5,"PieceSize":20}"#
        );
        for row in 0..3 {
            for col in 0..5 {
                assert!(out.join(format!("{row}/{col}.png")).is_file());
            }
        }
        assert!(!out.join("3").exists());
        assert!(!out.join("0/5.png").exists());
    }

    #[test]
    fn test_round_trip_is_pixel_identical() {
        let dir = tempfile::tempdir().unwrap();
        let built = Puzzle::build(gradient(105, 105), 50).unwrap();
        built.write_to_directory(dir.path()).unwrap();

        let loaded = Puzzle::from_directory(dir.path()).unwrap();
        assert_same_pieces(&built, &loaded);
        assert_eq!(loaded.image(), built.image());
    }

    #[test]
    fn test_round_trip_from_jpeg_source() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = dir.path().join("source.jpeg");
        DynamicImage::ImageRgb8(RgbImage::from_fn(48, 32, |x, y| {
            Rgb([(x * 5) as u8, (y * 7) as u8, 100])
        }))
        .save(&jpeg)
        .unwrap();

        let built = Puzzle::build(load_rgba_image(&jpeg).unwrap(), 16).unwrap();
        let out = dir.path().join("out");
        built.write_to_directory(&out).unwrap();
        let loaded = Puzzle::from_directory(&out).unwrap();
        assert_same_pieces(&built, &loaded);
    }

    #[test]
    fn test_write_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(40, 40), 20)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        let second = Puzzle::build(gradient(40, 40), 10).unwrap();
        second.write_to_directory(dir.path()).unwrap();

        let loaded = Puzzle::from_directory(dir.path()).unwrap();
        assert_eq!(loaded.piece_size(), 10);
        assert_same_pieces(&second, &loaded);
    }

    #[test]
    fn test_empty_puzzle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let built = Puzzle::build(gradient(30, 20), 25).unwrap();
        assert!(built.is_empty());
        built.write_to_directory(dir.path()).unwrap();

        let loaded = Puzzle::from_directory(dir.path()).unwrap();
        assert_eq!((loaded.rows(), loaded.columns()), (0, 1));
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_taken_image_writes_assembled_original() {
        let dir = tempfile::tempdir().unwrap();
        let mut puzzle = Puzzle::build(gradient(45, 33), 15).unwrap();
        puzzle.take_image();
        puzzle.write_to_directory(dir.path()).unwrap();

        let original = load_rgba_image(dir.path().join(ORIGINAL_IMAGE_FILE)).unwrap();
        assert_eq!(original.dimensions(), (45, 30));
        assert_eq!(original, puzzle.assemble());
        assert_same_pieces(&puzzle, &Puzzle::from_directory(dir.path()).unwrap());
    }

    #[test]
    fn test_write_into_file_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();

        let puzzle = Puzzle::build(gradient(20, 20), 10).unwrap();
        let err = puzzle.write_to_directory(blocker.join("out")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_missing_original_image_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(20, 20), 10)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        fs::remove_file(dir.path().join(ORIGINAL_IMAGE_FILE)).unwrap();

        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
        assert!(err.to_string().contains(ORIGINAL_IMAGE_FILE));
    }

    #[test]
    fn test_missing_metadata_is_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Metadata);
    }

    #[test]
    fn test_corrupt_metadata_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), b"{\"NumRows\": \"three\"}").unwrap();
        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_zero_piece_size_in_metadata_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"NumRows":1,"NumCols":1,"PieceSize":0}"#,
        )
        .unwrap();
        let err = read_metadata(dir.path().join(METADATA_FILE)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Metadata);
    }

    #[test]
    fn test_missing_piece_reports_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(60, 40), 20)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        fs::remove_file(piece_path(dir.path(), 1, 2)).unwrap();

        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
        assert_eq!(err.piece_coordinates(), Some((1, 2)));
        assert!(err.to_string().contains("2.png"));
    }

    #[test]
    fn test_undecodable_piece_reports_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(60, 40), 20)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        fs::write(piece_path(dir.path(), 0, 1), b"not a png").unwrap();

        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.piece_coordinates(), Some((0, 1)));
    }

    #[test]
    fn test_wrongly_sized_piece_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(60, 40), 20)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        gradient(19, 20).save(piece_path(dir.path(), 1, 0)).unwrap();

        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert_eq!(err.piece_coordinates(), Some((1, 0)));
        assert!(matches!(
            err,
            PuzzleError::Piece { ref source, .. }
                if matches!(**source, PuzzleError::DimensionMismatch { actual: (19, 20), .. })
        ));
    }

    #[test]
    fn test_original_too_small_for_grid() {
        let dir = tempfile::tempdir().unwrap();
        Puzzle::build(gradient(60, 40), 20)
            .unwrap()
            .write_to_directory(dir.path())
            .unwrap();
        gradient(50, 40)
            .save(dir.path().join(ORIGINAL_IMAGE_FILE))
            .unwrap();

        let err = Puzzle::from_directory(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            PuzzleError::DimensionMismatch {
                expected: (60, 40),
                actual: (50, 40),
                ..
            }
        ));
    }
}
