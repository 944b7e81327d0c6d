//! Adapters from the `image` crate to measurement frames.

use std::path::Path;

use ::image::{DynamicImage, GrayImage, ImageReader, RgbImage, RgbaImage};

use crate::core::{Frame, FrameError, FrameView, PixelLayout};

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] ::image::ImageError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Borrow an `image::RgbImage` as a frame view.
pub fn rgb_view(img: &RgbImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Rgb8,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbaImage` as a frame view.
pub fn rgba_view(img: &RgbaImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Rgba8,
        data: img.as_raw(),
    }
}

/// Borrow an `image::GrayImage` as a frame view.
pub fn gray_view(img: &GrayImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Gray8,
        data: img.as_raw(),
    }
}

/// Take ownership of a decoded image.
///
/// 8-bit gray, RGB and RGBA buffers are moved as they are; every other
/// pixel type is converted to RGBA8 first.
pub fn frame_from_image(img: DynamicImage) -> Result<Frame, ImageError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let (layout, data) = match img {
        DynamicImage::ImageLuma8(gray) => (PixelLayout::Gray8, gray.into_raw()),
        DynamicImage::ImageRgb8(rgb) => (PixelLayout::Rgb8, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelLayout::Rgba8, rgba.into_raw()),
        other => (PixelLayout::Rgba8, other.to_rgba8().into_raw()),
    };
    Ok(Frame::new(width, height, layout, data)?)
}

/// Decode an image file into a frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame, ImageError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    frame_from_image(img)
}

/// Copy a raw interleaved buffer into a frame, checking its geometry.
pub fn frame_from_slice(
    width: u32,
    height: u32,
    layout: PixelLayout,
    pixels: &[u8],
) -> Result<Frame, ImageError> {
    let (Ok(w), Ok(h)) = (usize::try_from(width), usize::try_from(height)) else {
        return Err(FrameError::InvalidDimensions {
            width: width as usize,
            height: height as usize,
        }
        .into());
    };
    Ok(Frame::new(w, h, layout, pixels.to_vec())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Luma, Rgb, Rgba};

    #[test]
    fn views_borrow_image_buffers() {
        let img: RgbImage = ImageBuffer::from_fn(4, 3, |x, _| Rgb([x as u8, 10, 20]));
        let view = rgb_view(&img);
        assert_eq!((view.width, view.height), (4, 3));
        assert!(view.validate().is_ok());
        assert_eq!(view.rgb(3, 2), [3, 10, 20]);

        let rgba: RgbaImage = ImageBuffer::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 9, 128]));
        let view = rgba_view(&rgba);
        assert_eq!(view.layout, PixelLayout::Rgba8);
        assert!(view.validate().is_ok());
        assert_eq!(view.data.len(), 3 * 2 * 4);
        assert_eq!(view.rgb(2, 1), [2, 1, 9]);

        let gray: GrayImage = ImageBuffer::from_pixel(5, 2, Luma([77]));
        assert_eq!(gray_view(&gray).luma(4, 1), 77);
    }

    #[test]
    fn sixteen_bit_images_become_rgba8() {
        let img = DynamicImage::new_luma16(6, 4);
        let frame = frame_from_image(img).expect("frame");
        assert_eq!(frame.layout, PixelLayout::Rgba8);
        assert_eq!(frame.data.len(), 6 * 4 * 4);
    }

    #[test]
    fn slice_length_is_checked() {
        let err = frame_from_slice(4, 4, PixelLayout::Rgb8, &[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::Frame(FrameError::BufferLength {
                expected: 48,
                got: 10
            })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_frame("/nonexistent/trunk.png").unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }
}
