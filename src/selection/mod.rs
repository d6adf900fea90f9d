//! Seed selection tools.
//!
//! Seeds are plain [`LabelMask`](crate::volume::LabelMask)s; any tool that
//! produces one works. The brush here paints round strokes the way an
//! interactive marker tool does.

pub mod brush;

pub use brush::{paint_disc, paint_sphere, DEFAULT_BRUSH_RADIUS};
