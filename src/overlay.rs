//! Owned overlay buffers.
//!
//! [`Overlay`] is a convenience wrapper for callers that do not manage their
//! own pixel memory: it owns a cleared BGRA32 buffer sized to a bounding box
//! and converts the rendered result into an [`image::RgbaImage`] for export.
//! The renderer itself only ever sees the raw byte slice.

use image::RgbaImage;

use crate::blend::BYTES_PER_PIXEL;
use crate::bounding_box::BoundingBox;

/// A caller-owned BGRA32 buffer covering one bounding box.
///
/// # Example
///
/// ```
/// use subrender::{BoundingBox, Overlay};
///
/// let mut overlay = Overlay::for_bounding_box(BoundingBox::new(10, 10, 20, 5));
/// assert_eq!(overlay.data().len(), 20 * 5 * 4);
/// assert!(overlay.data().iter().all(|&b| b == 0)); // starts transparent
/// ```
#[derive(Debug, Clone)]
pub struct Overlay {
    bounding_box: BoundingBox,
    data: Vec<u8>,
}

impl Overlay {
    /// Allocate a fully transparent buffer sized to `bounding_box`.
    pub fn for_bounding_box(bounding_box: BoundingBox) -> Self {
        Overlay {
            bounding_box,
            data: vec![0u8; bounding_box.area() as usize * BYTES_PER_PIXEL],
        }
    }

    /// The bounding box this buffer covers.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Raw BGRA32 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw BGRA32 bytes, for passing to
    /// [`SubtitleRenderer::render`](crate::SubtitleRenderer::render).
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Convert the buffer to an RGBA image (channel-swapped copy).
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut rgba = Vec::with_capacity(self.data.len());
        for pixel in self.data.chunks_exact(BYTES_PER_PIXEL) {
            rgba.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
        }
        RgbaImage::from_raw(self.bounding_box.width, self.bounding_box.height, rgba)
            .expect("buffer length matches bounding box dimensions")
    }
}
