//! Binary occupancy mask over a voxel grid.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use super::{checked_index, sub_block, Dims, Voxel};
use crate::error::{SegmentError, SegmentResult};

/// Binary label volume with values 0 (empty) and 1 (occupied).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMask {
    data: Array3<u8>,
}

impl LabelMask {
    /// Empty mask of the given size.
    pub fn zeros(dims: Dims) -> Self {
        Self {
            data: Array3::zeros(dims),
        }
    }

    /// Wrap label data; any non-zero label becomes 1.
    pub fn from_array(data: Array3<u8>) -> Self {
        Self {
            data: data.mapv(|v| u8::from(v != 0)),
        }
    }

    /// Build a mask from a flat buffer in `x, y, z` order (z fastest).
    pub fn from_shape_vec(dims: Dims, values: Vec<u8>) -> SegmentResult<Self> {
        Array3::from_shape_vec(dims, values)
            .map(Self::from_array)
            .map_err(|err| SegmentError::InvalidInput(format!("mask buffer: {err}")))
    }

    /// Mask with exactly the listed voxels occupied.
    pub fn from_voxels<I>(dims: Dims, voxels: I) -> SegmentResult<Self>
    where
        I: IntoIterator<Item = Voxel>,
    {
        let mut mask = Self::zeros(dims);
        for voxel in voxels {
            mask.set(voxel, true)?;
        }
        Ok(mask)
    }

    pub fn dimensions(&self) -> Dims {
        self.data.dim()
    }

    pub fn get(&self, voxel: Voxel) -> SegmentResult<bool> {
        let index = checked_index(self.dimensions(), voxel)?;
        Ok(self.data[index] != 0)
    }

    pub fn set(&mut self, voxel: Voxel, occupied: bool) -> SegmentResult<()> {
        let index = checked_index(self.dimensions(), voxel)?;
        self.data[index] = u8::from(occupied);
        Ok(())
    }

    /// Number of occupied voxels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Occupied voxels in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v != 0)
            .map(|(index, _)| Voxel::from_index(index))
    }

    /// Flags of the cube of side `2 * half + 1` around `center`.
    pub fn extract_sub_block(&self, center: Voxel, half: usize) -> SegmentResult<ArrayView3<'_, u8>> {
        sub_block(&self.data, center, half)
    }

    /// Number of slices along the first axis.
    pub fn slice_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Slice `index` along the first axis, shaped `(dy, dz)`.
    pub fn slice(&self, index: usize) -> SegmentResult<ArrayView2<'_, u8>> {
        self.check_slice(index)?;
        Ok(self.data.index_axis(Axis(0), index))
    }

    /// Replace slice `index`, normalizing values to 0/1.
    pub fn write_slice(&mut self, index: usize, slice: &Array2<u8>) -> SegmentResult<()> {
        self.check_slice(index)?;
        let (_, dy, dz) = self.dimensions();
        if slice.dim() != (dy, dz) {
            return Err(SegmentError::InvalidInput(format!(
                "slice shape {:?} does not match ({dy}, {dz})",
                slice.dim()
            )));
        }
        self.data
            .index_axis_mut(Axis(0), index)
            .zip_mut_with(slice, |dst, &src| *dst = u8::from(src != 0));
        Ok(())
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// Label volume with occupied voxels set to `label`.
    pub fn label_map(&self, label: u8) -> Array3<u8> {
        self.data.mapv(|v| if v != 0 { label } else { 0 })
    }

    fn check_slice(&self, index: usize) -> SegmentResult<()> {
        if index >= self.slice_count() {
            return Err(SegmentError::OutOfBounds {
                voxel: Voxel::new(index as isize, 0, 0),
                dims: self.dimensions(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_array_normalizes_labels() {
        let mut data = Array3::<u8>::zeros((2, 2, 2));
        data[[0, 0, 0]] = 7;
        data[[1, 1, 1]] = 255;

        let mask = LabelMask::from_array(data);
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.view()[[0, 0, 0]], 1);
        assert_eq!(mask.view()[[1, 1, 1]], 1);
    }

    #[test]
    fn test_set_get_bounds() {
        let mut mask = LabelMask::zeros((3, 3, 3));
        assert!(mask.is_empty());

        mask.set(Voxel::new(1, 2, 0), true).unwrap();
        assert!(mask.get(Voxel::new(1, 2, 0)).unwrap());
        assert!(!mask.get(Voxel::new(0, 0, 0)).unwrap());
        assert!(mask.set(Voxel::new(3, 0, 0), true).is_err());
        assert!(mask.get(Voxel::new(0, -1, 0)).is_err());
    }

    #[test]
    fn test_occupied_is_row_major() {
        let voxels = [Voxel::new(2, 0, 0), Voxel::new(0, 1, 2), Voxel::new(0, 1, 1)];
        let mask = LabelMask::from_voxels((3, 3, 3), voxels).unwrap();
        let listed: Vec<Voxel> = mask.occupied().collect();
        assert_eq!(
            listed,
            vec![Voxel::new(0, 1, 1), Voxel::new(0, 1, 2), Voxel::new(2, 0, 0)]
        );
    }

    #[test]
    fn test_slice_round_trip() {
        let mut mask = LabelMask::zeros((2, 3, 4));
        let mut slice = Array2::<u8>::zeros((3, 4));
        slice[[0, 3]] = 255;
        slice[[2, 1]] = 1;

        mask.write_slice(1, &slice).unwrap();
        assert_eq!(mask.count(), 2);
        assert!(mask.get(Voxel::new(1, 0, 3)).unwrap());
        assert_eq!(mask.slice(1).unwrap()[[2, 1]], 1);
        assert_eq!(mask.slice(0).unwrap().sum(), 0);

        assert!(mask.slice(2).is_err());
        assert!(mask.write_slice(0, &Array2::zeros((4, 3))).is_err());
    }

    #[test]
    fn test_label_map() {
        let mask = LabelMask::from_voxels((2, 2, 2), [Voxel::new(0, 1, 0)]).unwrap();
        let labels = mask.label_map(3);
        assert_eq!(labels[[0, 1, 0]], 3);
        assert_eq!(labels.sum(), 3);
    }
}
