use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use image::{ImageReader, RgbaImage};
use log::debug;

use crate::error::{PuzzleError, Result};

/// Decodes the image at `path` into a non-premultiplied RGBA8 buffer.
///
/// The format is sniffed from the file content, so a JPEG saved with a `.png` extension still
/// decodes. Whatever the source layout (grey, RGB, 16 bit, ...), the result always has four 8 bit
/// channels, which keeps repeated save/load cycles lossless.
pub fn load_rgba_image(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => PuzzleError::InputNotFound {
            path: path.to_path_buf(),
            source: err,
        },
        _ => PuzzleError::io("open", path, err),
    })?;

    let reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|err| PuzzleError::io("read", path, err))?;
    let format = reader.format();
    let image = reader.decode().map_err(|source| PuzzleError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "decoded {} as {:?} ({:?}, {}x{})",
        path.display(),
        format,
        image.color(),
        image.width(),
        image.height()
    );

    Ok(image.into_rgba8())
}
