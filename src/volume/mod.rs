//! Dense voxel containers: intensity grids and binary label masks.
//!
//! Both containers store `ndarray` arrays in standard (row-major) layout and
//! index them as `[x, y, z]`, where `x` is the first (slowest) axis. Every
//! accessor validates coordinates first; nothing is clamped into range.

pub mod grid;
pub mod mask;

pub use grid::VoxelGrid;
pub use mask::LabelMask;

use std::fmt;

use ndarray::{s, ArrayBase, ArrayView3, Data, Ix3};

use crate::error::{SegmentError, SegmentResult};

/// Grid dimensions `(dx, dy, dz)`.
pub type Dims = (usize, usize, usize);

/// A signed voxel coordinate.
///
/// Signed so that candidate coordinates around a seed can be formed before
/// they are checked against the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Voxel {
    pub x: isize,
    pub y: isize,
    pub z: isize,
}

impl Voxel {
    pub const fn new(x: isize, y: isize, z: isize) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev (chessboard) distance, the half-width of the smallest cube
    /// around `self` that contains `other`.
    pub fn chebyshev(&self, other: &Voxel) -> usize {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        let dz = (self.z - other.z).unsigned_abs();
        dx.max(dy).max(dz)
    }

    pub(crate) fn from_index((x, y, z): (usize, usize, usize)) -> Self {
        Self::new(x as isize, y as isize, z as isize)
    }
}

impl fmt::Display for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Convert `voxel` to an array index, failing if it lies outside `dims`.
pub fn checked_index(dims: Dims, voxel: Voxel) -> SegmentResult<[usize; 3]> {
    let inside = |c: isize, d: usize| c >= 0 && (c as usize) < d;
    if inside(voxel.x, dims.0) && inside(voxel.y, dims.1) && inside(voxel.z, dims.2) {
        Ok([voxel.x as usize, voxel.y as usize, voxel.z as usize])
    } else {
        Err(SegmentError::OutOfBounds { voxel, dims })
    }
}

/// True when the cube of half-width `half` around `center` touches or
/// crosses the outermost layer of a grid of size `dims` on any axis.
pub fn touches_boundary(center: Voxel, half: usize, dims: Dims) -> bool {
    let half = half as isize;
    let axis = |c: isize, d: usize| c - half <= 0 || c + half >= d as isize - 1;
    axis(center.x, dims.0) || axis(center.y, dims.1) || axis(center.z, dims.2)
}

/// Borrow the cube of side `2 * half + 1` centered on `center`.
///
/// Both opposite corners are validated, so a block straddling the grid edge
/// is an error rather than a truncated view.
pub(crate) fn sub_block<S, T>(
    array: &ArrayBase<S, Ix3>,
    center: Voxel,
    half: usize,
) -> SegmentResult<ArrayView3<'_, T>>
where
    S: Data<Elem = T>,
{
    let dims = array.dim();
    let h = half as isize;
    let lo = checked_index(dims, Voxel::new(center.x - h, center.y - h, center.z - h))?;
    let hi = checked_index(dims, Voxel::new(center.x + h, center.y + h, center.z + h))?;
    Ok(array.slice(s![lo[0]..=hi[0], lo[1]..=hi[1], lo[2]..=hi[2]]))
}
