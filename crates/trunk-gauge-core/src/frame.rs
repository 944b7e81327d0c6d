use serde::{Deserialize, Serialize};

use crate::FrameError;

/// Channel layout of an interleaved 8-bit frame buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// Single luma channel.
    Gray8,
    Rgb8,
    /// `OpenCV` channel order.
    Bgr8,
    #[default]
    Rgba8,
    Bgra8,
}

impl PixelLayout {
    /// Bytes per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }

    /// Byte offsets of the red, green and blue samples inside one pixel.
    #[inline]
    const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            Self::Gray8 => [0, 0, 0],
            Self::Rgb8 | Self::Rgba8 => [0, 1, 2],
            Self::Bgr8 | Self::Bgra8 => [2, 1, 0],
        }
    }

    #[inline]
    pub const fn is_color(self) -> bool {
        !matches!(self, Self::Gray8)
    }
}

/// Expected buffer length for a frame, or `None` when the product overflows.
fn buffer_len(width: usize, height: usize, layout: PixelLayout) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(layout.channels())
}

fn check_geometry(
    width: usize,
    height: usize,
    layout: PixelLayout,
    got: usize,
) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    let expected =
        buffer_len(width, height, layout).ok_or(FrameError::InvalidDimensions { width, height })?;
    if got != expected {
        return Err(FrameError::BufferLength { expected, got });
    }
    Ok(())
}

/// BT.601 luma with 8-bit fixed point weights (77, 150, 29).
#[inline]
pub fn luma_from_rgb([r, g, b]: [u8; 3]) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

/// Borrowed, read-only view of an interleaved frame.
///
/// This is the only shape in which pixels enter the measurement core. The
/// view cannot outlive the caller's buffer, so nothing downstream can keep
/// the pixels alive past the call that received them.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8], // row-major, len = w*h*channels
}

impl<'a> FrameView<'a> {
    /// Build a view after checking that `data` matches the declared geometry.
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        check_geometry(width, height, layout, data.len())?;
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Re-check geometry of a view assembled from its public fields.
    pub fn validate(&self) -> Result<(), FrameError> {
        check_geometry(self.width, self.height, self.layout, self.data.len())
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.layout.channels()
    }

    /// RGB triple at `(x, y)`. Gray frames replicate luma into all channels.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let base = self.offset(x, y);
        let [r, g, b] = self.layout.rgb_offsets();
        [
            self.data[base + r],
            self.data[base + g],
            self.data[base + b],
        ]
    }

    #[inline]
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        match self.layout {
            PixelLayout::Gray8 => self.data[self.offset(x, y)],
            _ => luma_from_rgb(self.rgb(x, y)),
        }
    }

    /// Write row `y` as luma into `out`, replacing its contents.
    pub fn luma_row_into(&self, y: usize, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..self.width).map(|x| self.luma(x, y)));
    }
}

/// Owned frame buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        check_geometry(width, height, layout, data.len())?;
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Render a frame from a per-pixel RGB function.
    ///
    /// Alpha is written opaque; gray layouts store the BT.601 luma.
    pub fn from_rgb_fn(
        width: usize,
        height: usize,
        layout: PixelLayout,
        mut f: impl FnMut(usize, usize) -> [u8; 3],
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let len =
            buffer_len(width, height, layout).ok_or(FrameError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                let rgb = f(x, y);
                match layout {
                    PixelLayout::Gray8 => data.push(luma_from_rgb(rgb)),
                    PixelLayout::Rgb8 => data.extend_from_slice(&rgb),
                    PixelLayout::Bgr8 => data.extend_from_slice(&[rgb[2], rgb[1], rgb[0]]),
                    PixelLayout::Rgba8 => data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]),
                    PixelLayout::Bgra8 => data.extend_from_slice(&[rgb[2], rgb[1], rgb[0], 255]),
                }
            }
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            layout: self.layout,
            data: &self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = FrameView::new(4, 2, PixelLayout::Rgb8, &[0u8; 23]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferLength {
                expected: 24,
                got: 23
            }
        );
        let err = Frame::new(0, 2, PixelLayout::Gray8, Vec::new()).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
    }

    #[test]
    fn channel_order_is_respected() {
        let px = [200u8, 100, 50];
        for layout in [
            PixelLayout::Rgb8,
            PixelLayout::Bgr8,
            PixelLayout::Rgba8,
            PixelLayout::Bgra8,
        ] {
            let frame = Frame::from_rgb_fn(3, 2, layout, |_, _| px).expect("frame");
            let view = frame.view();
            assert_eq!(view.rgb(2, 1), px, "{layout:?}");
            assert_eq!(view.luma(1, 1), luma_from_rgb(px), "{layout:?}");
        }
    }

    #[test]
    fn gray_layout_stores_luma() {
        let frame = Frame::from_rgb_fn(2, 2, PixelLayout::Gray8, |x, _| {
            if x == 0 {
                [0, 0, 0]
            } else {
                [255, 255, 255]
            }
        })
        .expect("frame");
        assert_eq!(frame.data, vec![0, 255, 0, 255]);
        assert_eq!(frame.view().rgb(1, 0), [255, 255, 255]);

        let mut row = Vec::new();
        frame.view().luma_row_into(1, &mut row);
        assert_eq!(row, vec![0, 255]);
    }
}
