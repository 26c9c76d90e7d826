use std::path::Path;

use ndarray::{Array2, ArrayView1};
use ::image::{GrayImage, ImageFormat, Luma};
use log::warn;

use crate::error::{ReconstructionError, Result};
use crate::types::{Index1, Index2, Intensity, Pixel, EPS_STD, MAX_PIXEL};

/// Square grid of 8-bit intensities, indexed `[row, column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub data: Array2<Pixel>,
}

impl Grid {

    /// Render a reconstructed vector as an image.
    ///
    /// Negative values are clipped to zero and the result scaled so that its
    /// maximum becomes 255; a vector with no positive values renders black.
    /// Values are laid out column-major on a `side x side` grid where
    /// `side = floor(sqrt(len))`. Trailing values that do not fill a complete
    /// column are dropped; an empty vector is rejected.
    pub fn render(f: ArrayView1<Intensity>) -> Result<Self> {
        let len = f.len();
        let side = integer_sqrt(len);
        if side == 0 { return Err(ReconstructionError::InvalidGridSize { len }) }
        if side * side != len {
            warn!("{len} values do not fill a square grid: dropping the last {}", len - side * side);
        }

        let clipped = f.mapv(|x| x.max(0.0));
        let max = clipped.fold(0.0, |a: Intensity, &b| a.max(b));
        let mut data = Array2::zeros((side, side));
        if max > EPS_STD {
            // `clipped / max * 255`, in that order: rounding depends on it
            for (k, &value) in clipped.iter().take(side * side).enumerate() {
                data[index1_to_2(k, side)] = to_pixel(value / max * MAX_PIXEL);
            }
        }
        Ok(Self { data })
    }

    pub fn side(&self) -> usize { self.data.nrows() }

    /// `"{side}x{side}"`
    pub fn size_label(&self) -> String { format!("{0}x{0}", self.side()) }

    pub fn to_gray_image(&self) -> GrayImage {
        let side = self.side() as u32;
        GrayImage::from_fn(side, side, |x, y| Luma([self.data[[y as usize, x as usize]]]))
    }

    /// Encode as an 8-bit grayscale PNG
    pub fn to_png(&self) -> std::result::Result<Vec<u8>, ::image::ImageError> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.to_gray_image().write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn write_png(&self, path: &Path) -> std::result::Result<(), ::image::ImageError> {
        self.to_gray_image().save_with_format(path, ImageFormat::Png)
    }
}

impl core::ops::Index<Index2> for Grid {
    type Output = Pixel;
    #[inline]
    fn index(&self, i: Index2) -> &Self::Output { &self.data[i] }
}

#[inline]
fn to_pixel(x: Intensity) -> Pixel { x.round().clamp(0.0, MAX_PIXEL) as Pixel }

/// Largest `n` such that `n * n <= len`
fn integer_sqrt(len: usize) -> usize {
    let mut n = (len as f64).sqrt() as usize;
    while n * n > len { n -= 1 }
    while (n + 1) * (n + 1) <= len { n += 1 }
    n
}

// --------------------------------------------------------------------------------
//          Conversion between flat and `[row, column]` grid indices

/// Column-major: the flat index runs down each column before moving right.
pub fn index1_to_2(k: Index1, side: usize) -> Index2 {
    [k % side, k / side]
}

pub fn index2_to_1([row, col]: Index2, side: usize) -> Index1 {
    row + col * side
}
