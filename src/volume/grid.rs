//! Dense scalar intensity volume.

use ndarray::{Array3, ArrayView3, Zip};

use super::{checked_index, sub_block, Dims, LabelMask, Voxel};
use crate::error::{SegmentError, SegmentResult};

/// Immutable 3D intensity grid indexed `[x, y, z]`.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    data: Array3<f32>,
}

impl VoxelGrid {
    /// Wrap an owned intensity array.
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Build a grid from a flat buffer in `x, y, z` order (z fastest).
    pub fn from_shape_vec(dims: Dims, values: Vec<f32>) -> SegmentResult<Self> {
        let expected = dims
            .0
            .checked_mul(dims.1)
            .and_then(|n| n.checked_mul(dims.2))
            .ok_or_else(|| {
                SegmentError::InvalidInput(format!("volume {}x{}x{} is too large", dims.0, dims.1, dims.2))
            })?;
        if values.len() != expected {
            return Err(SegmentError::InvalidInput(format!(
                "volume buffer holds {} values, {}x{}x{} needs {}",
                values.len(),
                dims.0,
                dims.1,
                dims.2,
                expected
            )));
        }
        Array3::from_shape_vec(dims, values)
            .map(Self::new)
            .map_err(|err| SegmentError::InvalidInput(err.to_string()))
    }

    /// Convert a 16-bit volume, as stored by most CT scanners.
    pub fn from_i16(data: ArrayView3<i16>) -> Self {
        Self::new(data.mapv(f32::from))
    }

    pub fn dimensions(&self) -> Dims {
        self.data.dim()
    }

    /// Intensity at `voxel`.
    pub fn get(&self, voxel: Voxel) -> SegmentResult<f32> {
        let index = checked_index(self.dimensions(), voxel)?;
        Ok(self.data[index])
    }

    /// Intensities of the cube of side `2 * half + 1` around `center`.
    ///
    /// Fails with `OutOfBounds` instead of clipping when the cube leaves the
    /// grid.
    pub fn extract_sub_block(&self, center: Voxel, half: usize) -> SegmentResult<ArrayView3<'_, f32>> {
        sub_block(&self.data, center, half)
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array3<f32> {
        self.data
    }

    /// Copy of the volume with every voxel occupied in `mask` set to `value`.
    pub fn painted(&self, mask: &LabelMask, value: f32) -> SegmentResult<VoxelGrid> {
        if mask.dimensions() != self.dimensions() {
            return Err(SegmentError::InvalidInput(format!(
                "mask dimensions {:?} differ from volume dimensions {:?}",
                mask.dimensions(),
                self.dimensions()
            )));
        }
        let mut data = self.data.clone();
        Zip::from(&mut data)
            .and(mask.view())
            .for_each(|voxel, &flag| {
                if flag != 0 {
                    *voxel = value;
                }
            });
        Ok(Self::new(data))
    }
}
