use std::path::Path;

use image::{imageops, DynamicImage, GenericImageView, RgbaImage};
use log::{debug, info};
use rayon::prelude::*;

use crate::error::{PuzzleError, Result};
use crate::loader::load_rgba_image;
use crate::storage::PuzzleMetadata;

/// Returns the number of rows and columns of `piece_size` squares that fit into an image of the
/// given size. Any remainder along the right and bottom edges is left out of the grid.
pub fn grid_dimensions(width: u32, height: u32, piece_size: u32) -> Result<(u32, u32)> {
    if piece_size == 0 {
        return Err(PuzzleError::InvalidArgument(
            "piece size must be a positive number of pixels".to_string(),
        ));
    }
    Ok((height / piece_size, width / piece_size))
}

/// One square tile of the source image
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub row: u32,
    pub col: u32,
    /// Owned copy of the tile's pixels
    pub image: RgbaImage,
}

impl Piece {
    pub fn new(row: u32, col: u32, image: RgbaImage) -> Self {
        Piece { row, col, image }
    }

    /// Copies the tile at (`row`, `col`) out of `source`. The caller guarantees the tile lies
    /// inside the image.
    fn crop(source: &RgbaImage, row: u32, col: u32, piece_size: u32) -> Self {
        let (x, y) = (col * piece_size, row * piece_size);
        debug!("cropping piece ({row}, {col}) at {x},{y}");
        let image = source.view(x, y, piece_size, piece_size).to_image();
        Piece { row, col, image }
    }

    /// Top left corner of this piece inside the original image
    pub fn origin(&self, piece_size: u32) -> (u32, u32) {
        (self.col * piece_size, self.row * piece_size)
    }
}

/// A source image cut into a grid of square pieces.
///
/// The pieces are kept in row-major order, but lookups should go through [`Puzzle::get`].
#[derive(Debug, Clone)]
pub struct Puzzle {
    image: Option<RgbaImage>,
    rows: u32,
    columns: u32,
    piece_size: u32,
    pieces: Vec<Piece>,
}

impl Puzzle {
    /// Cuts `image` into `piece_size` squares.
    ///
    /// `rows = height / piece_size` and `columns = width / piece_size`; the pixels past the last
    /// full row or column are dropped. A piece size larger than the image yields an empty puzzle.
    pub fn build(image: RgbaImage, piece_size: u32) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (rows, columns) = grid_dimensions(width, height, piece_size)?;
        debug!("dimensions {width}x{height}");
        debug!("{rows} rows {columns} cols");

        let count = rows as usize * columns as usize;
        let pieces = (0..count)
            .into_par_iter()
            .map(|index| {
                let row = (index / columns as usize) as u32;
                let col = (index % columns as usize) as u32;
                Piece::crop(&image, row, col, piece_size)
            })
            .collect::<Vec<_>>();

        Ok(Puzzle {
            image: Some(image),
            rows,
            columns,
            piece_size,
            pieces,
        })
    }

    pub(crate) fn from_parts(
        image: RgbaImage,
        metadata: PuzzleMetadata,
        pieces: Vec<Piece>,
    ) -> Self {
        Puzzle {
            image: Some(image),
            rows: metadata.rows,
            columns: metadata.columns,
            piece_size: metadata.piece_size,
            pieces,
        }
    }

    /// Returns the piece at (`row`, `col`)
    pub fn get(&self, row: u32, col: u32) -> Result<&Piece> {
        self.pieces
            .iter()
            .find(|piece| piece.row == row && piece.col == col)
            .ok_or(PuzzleError::PieceNotFound { row, col })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn piece_size(&self) -> u32 {
        self.piece_size
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The full source image, as long as it has not been taken
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Removes the source image from the puzzle, leaving only the pieces
    pub fn take_image(&mut self) -> Option<RgbaImage> {
        self.image.take()
    }

    pub fn metadata(&self) -> PuzzleMetadata {
        PuzzleMetadata {
            rows: self.rows,
            columns: self.columns,
            piece_size: self.piece_size,
        }
    }

    /// Stitches the pieces back together into an image of
    /// `columns * piece_size` x `rows * piece_size` pixels
    pub fn assemble(&self) -> RgbaImage {
        let mut canvas =
            RgbaImage::new(self.columns * self.piece_size, self.rows * self.piece_size);
        for piece in &self.pieces {
            let (x, y) = piece.origin(self.piece_size);
            imageops::replace(&mut canvas, &piece.image, x as i64, y as i64);
        }
        canvas
    }
}

/// Builds a [`Puzzle`] from an image.
///
/// `seed` is accepted for compatibility with callers that pass one, but it is reserved: every
/// piece is a plain square and the cut does not depend on it.
#[derive(Debug)]
pub struct PuzzleGenerator {
    /// The normalised image the pieces will be cut from.
    origin_image: RgbaImage,
    /// Edge length of a piece in pixels.
    piece_size: u32,
    /// Reserved, has no effect on the generated puzzle.
    seed: Option<u64>,
}

impl PuzzleGenerator {
    pub fn new(origin_image: DynamicImage, piece_size: u32) -> Self {
        PuzzleGenerator {
            origin_image: origin_image.into_rgba8(),
            piece_size,
            seed: None,
        }
    }

    pub fn from_rgba8(
        width: u32,
        height: u32,
        image_bytes: &[u8],
        piece_size: u32,
    ) -> Result<Self> {
        let origin_image =
            RgbaImage::from_raw(width, height, image_bytes.to_vec()).ok_or_else(|| {
                PuzzleError::InvalidArgument(format!(
                    "{} bytes do not make a {width}x{height} RGBA image",
                    image_bytes.len()
                ))
            })?;
        Ok(PuzzleGenerator {
            origin_image,
            piece_size,
            seed: None,
        })
    }

    /// Creates a new `PuzzleGenerator` from the image file at `image_path`
    pub fn from_path(image_path: impl AsRef<Path>, piece_size: u32) -> Result<Self> {
        let image_path = image_path.as_ref();
        let origin_image = load_rgba_image(image_path)?;
        info!(
            "loaded image from {} with dimensions {}x{}",
            image_path.display(),
            origin_image.width(),
            origin_image.height()
        );
        Ok(PuzzleGenerator {
            origin_image,
            piece_size,
            seed: None,
        })
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn origin_image(&self) -> &RgbaImage {
        &self.origin_image
    }

    pub fn piece_size(&self) -> u32 {
        self.piece_size
    }

    pub fn generate(self) -> Result<Puzzle> {
        if let Some(seed) = self.seed {
            debug!("seed {seed} is reserved and ignored");
        }
        Puzzle::build(self.origin_image, self.piece_size)
    }
}
