//! Slice-wise cleanup of grown masks.
//!
//! - [`hull`] - monotone-chain convex hull and solid polygon fill
//! - [`morphology`] - binary erode, dilate, open and close
//! - [`slice`] - the [`SliceRefiner`] driving both over every slice

pub mod hull;
pub mod morphology;
pub mod slice;

pub use hull::{convex_hull, fill_convex, Pixel};
pub use morphology::StructuringElement;
pub use slice::{RasterGeometry, RefineReport, SliceGeometry, SliceOutcome, SliceRefiner};
