//! Decoding and normalization of uploaded images.
//!
//! Every successfully decoded image, whatever its resolution or color type,
//! comes out as an NHWC tensor of shape [`INPUT_SHAPE`] with values in
//! `[0, 1]`.

use crate::error::{Error, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageReader};
use ndarray::Array4;
use std::{
    io::{self, Cursor, Read},
    path::Path,
};

/// Image tensor in NHWC layout (batch, height, width, channels).
pub type ImageTensor = Array4<f32>;

/// Side length the model expects, in pixels.
pub const IMAGE_SIZE: u32 = 224;

pub const RGB_CHANNELS: usize = 3;

pub const INPUT_SHAPE: [usize; 4] = [1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, RGB_CHANNELS];

/// Loads an image from disk.
///
/// A nonexistent path yields [`Error::NotFound`]. The format is guessed from
/// the file content, so a misleading extension does not matter.
pub fn preprocess_path<P: AsRef<Path>>(path: P) -> Result<ImageTensor> {
    let path = path.as_ref();

    let image_reader = ImageReader::open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        })?
        .with_guessed_format()
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let img = image_reader.decode()?;
    image_to_tensor(&img)
}

/// Decodes an in-memory upload.
pub fn preprocess_bytes(image_data: &[u8]) -> Result<ImageTensor> {
    let image_reader = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(Error::Stream)?;

    let img = image_reader.decode()?;
    image_to_tensor(&img)
}

/// Drains `reader` and decodes what it produced.
pub fn preprocess_reader<R: Read>(mut reader: R) -> Result<ImageTensor> {
    let mut image_data = Vec::new();
    reader
        .read_to_end(&mut image_data)
        .map_err(Error::Stream)?;

    preprocess_bytes(&image_data)
}

fn image_to_tensor(img: &DynamicImage) -> Result<ImageTensor> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    // Exact resize: the aspect ratio is not preserved.
    let rgb = img
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Nearest)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros(INPUT_SHAPE);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = pixel.0;
        tensor[[0, y, x, 0]] = f32::from(r) / 255.;
        tensor[[0, y, x, 1]] = f32::from(g) / 255.;
        tensor[[0, y, x, 2]] = f32::from(b) / 255.;
    }

    Ok(tensor)
}
