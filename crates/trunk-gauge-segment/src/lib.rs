//! Trunk silhouette segmentation on a single frame.
//!
//! [`TrunkSegmenter`] scans a horizontal band through the middle of the
//! frame, asks a [`TrunkPredicate`] which pixels of each scanned row look
//! like trunk, and reduces the per-row spans to one apparent width in
//! pixels plus a confidence score.
//!
//! Two predicates ship with the crate:
//! - [`ToneThreshold`] (default): Otsu split of the band's luma, with green
//!   vegetation treated as background for color frames.
//! - [`EdgePair`]: strongest pair of opposite horizontal edges per row.
//!
//! Frames where the middle band is occluded are retried on an upper and a
//! lower band (see [`SegmenterParams::fallback_bands`]).
//!
//! ```
//! use trunk_gauge_core::{Frame, PixelLayout};
//! use trunk_gauge_segment::TrunkSegmenter;
//!
//! let frame = Frame::from_rgb_fn(320, 240, PixelLayout::Rgb8, |x, _| {
//!     if (140..180).contains(&x) { [90, 70, 50] } else { [210, 220, 235] }
//! })
//! .unwrap();
//! let res = TrunkSegmenter::default().segment(&frame.view());
//! assert_eq!(res.trunk_pixel_width, 40);
//! ```

mod params;
mod predicate;
mod result;
mod segmenter;
mod threshold;

pub use params::{EdgeParams, Polarity, PredicateKind, SegmenterParams, ToneParams};
pub use predicate::{is_foliage, rgb_to_hsv, EdgePair, ScanRow, ToneThreshold, TrunkPredicate};
pub use result::{BandPosition, PixelRegion, RowSpan, SegmentationResult};
pub use segmenter::TrunkSegmenter;
