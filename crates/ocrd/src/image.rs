//! Decoding and cropping of workspace images.

use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

impl From<[[u32; 2]; 2]> for CropBox {
    fn from([[x0, y0], [x1, y1]]: [[u32; 2]; 2]) -> Self {
        Self::new(x0, y0, x1, y1)
    }
}

/// Decode an image, guessing the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::Io {
            path: "<memory>".into(),
            source: e,
        })?;
    Ok(reader.decode()?)
}

/// Open an image file. The format is taken from the content, so files
/// without an extension work.
pub fn open(path: &Path) -> Result<DynamicImage> {
    let io_error = |e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let reader = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?;
    Ok(reader.decode()?)
}

/// Cut `area` out of `image`.
pub fn crop(image: &DynamicImage, area: CropBox) -> Result<DynamicImage> {
    let (width, height) = image.dimensions();
    if area.width() == 0 || area.height() == 0 || area.x1 > width || area.y1 > height {
        return Err(Error::Argument(format!(
            "crop box {area:?} is empty or exceeds the {width}x{height} image"
        )));
    }
    Ok(image.crop_imm(area.x0, area.y0, area.width(), area.height()))
}
