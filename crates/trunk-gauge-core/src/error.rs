/// Malformed frame geometry or pixel buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

/// Inputs rejected by the projection arithmetic.
///
/// Every variant points at a bad argument at the call site; none of them is
/// worth retrying with the same arguments.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("subject distance must be finite and positive (got {0} m)")]
    NonPositiveDistance(f64),

    #[error("trunk pixel width must be positive")]
    NonPositivePixelWidth,

    #[error("frame width must be positive")]
    NonPositiveFrameWidth,

    #[error("trunk pixel width {pixel_width} exceeds frame width {frame_width}")]
    PixelWidthExceedsFrame { pixel_width: u32, frame_width: u32 },

    #[error("field of view must lie strictly inside (0, 180) degrees (got h={horizontal}, v={vertical})")]
    InvalidFieldOfView { horizontal: f64, vertical: f64 },

    #[error("reference object must have a finite positive size (pixels={pixels}, meters={meters})")]
    InvalidReference { pixels: f64, meters: f64 },

    /// Valid inputs whose product overflowed or underflowed `f64`.
    #[error("projected {quantity} is not a finite positive number (got {value})")]
    ScaleOutOfRange { quantity: &'static str, value: f64 },

    #[error(transparent)]
    Frame(#[from] FrameError),
}
