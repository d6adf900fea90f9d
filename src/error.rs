//! Error types for segmentation operations.

use thiserror::Error;

use crate::volume::{Dims, Voxel};

/// Errors that can occur while growing or refining a region.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Inputs rejected before any work begins.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The seed mask marks no voxel, so no seed statistics exist.
    #[error("Seed mask has no marked voxels")]
    EmptySeedSet,

    /// An access fell outside the grid.
    ///
    /// Growth rules this out with its boundary check; seeing it means the
    /// run is aborted.
    #[error("Voxel {voxel} is outside grid of dimensions {}x{}x{}", dims.0, dims.1, dims.2)]
    OutOfBounds { voxel: Voxel, dims: Dims },

    /// Too few on-pixels in a slice to form a hull polygon.
    #[error("Slice has {pixels} on-pixels, at least 3 are needed for a convex hull")]
    DegenerateSlice { pixels: usize },
}

/// Result type for segmentation operations.
pub type SegmentResult<T> = std::result::Result<T, SegmentError>;
