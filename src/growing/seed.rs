//! Seed statistics and intensity bands.

use crate::error::{SegmentError, SegmentResult};
use crate::volume::{LabelMask, Voxel, VoxelGrid};

/// Open intensity interval `(lower, upper)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensityRange {
    pub lower: f32,
    pub upper: f32,
}

impl IntensityRange {
    /// Band `[min - compensate, max + compensate]`.
    pub fn around(min: f32, max: f32, compensate: f32) -> Self {
        Self {
            lower: min - compensate,
            upper: max + compensate,
        }
    }

    /// Strict containment; values equal to a bound are outside.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Read-only summary of the seed voxels, computed once per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedStatistics {
    /// Brightest seed voxel; growth shells are centered here.
    pub seed: Voxel,
    pub min_intensity: f32,
    pub max_intensity: f32,
    /// Admissible band for any grown voxel.
    pub global_range: IntensityRange,
    pub voxel_count: usize,
    /// Largest Chebyshev distance from `seed` to any seed voxel.
    pub extent: usize,
}

impl SeedStatistics {
    /// Summarize the seeds of `seeds` over `volume`.
    ///
    /// Ties for the brightest voxel go to the first in row-major order.
    pub fn compute(volume: &VoxelGrid, seeds: &LabelMask, compensate: f32) -> SegmentResult<Self> {
        if volume.dimensions() != seeds.dimensions() {
            return Err(SegmentError::InvalidInput(format!(
                "seed mask dimensions {:?} differ from volume dimensions {:?}",
                seeds.dimensions(),
                volume.dimensions()
            )));
        }

        let mut samples = Vec::new();
        for voxel in seeds.occupied() {
            samples.push((voxel, volume.get(voxel)?));
        }

        let (&(first, first_value), rest) = samples.split_first().ok_or(SegmentError::EmptySeedSet)?;
        let mut seed = first;
        let mut min_intensity = first_value;
        let mut max_intensity = first_value;
        for &(voxel, value) in rest {
            if value > max_intensity {
                max_intensity = value;
                seed = voxel;
            }
            min_intensity = min_intensity.min(value);
        }

        let extent = samples
            .iter()
            .map(|(voxel, _)| voxel.chebyshev(&seed))
            .max()
            .unwrap_or(0);

        Ok(Self {
            seed,
            min_intensity,
            max_intensity,
            global_range: IntensityRange::around(min_intensity, max_intensity, compensate),
            voxel_count: samples.len(),
            extent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_range_is_strict() {
        let range = IntensityRange::around(50.0, 60.0, 5.0);
        assert_eq!(range.lower, 45.0);
        assert_eq!(range.upper, 65.0);
        assert!(range.contains(45.5));
        assert!(range.contains(64.9));
        assert!(!range.contains(45.0));
        assert!(!range.contains(65.0));
    }

    #[test]
    fn test_statistics_pick_brightest_seed() {
        let mut data = Array3::<f32>::zeros((5, 5, 5));
        data[[1, 1, 1]] = 40.0;
        data[[2, 2, 2]] = 70.0;
        data[[3, 1, 2]] = 55.0;
        let volume = VoxelGrid::new(data);
        let seeds = LabelMask::from_voxels(
            (5, 5, 5),
            [Voxel::new(1, 1, 1), Voxel::new(2, 2, 2), Voxel::new(3, 1, 2)],
        )
        .unwrap();

        let stats = SeedStatistics::compute(&volume, &seeds, 10.0).unwrap();
        assert_eq!(stats.seed, Voxel::new(2, 2, 2));
        assert_eq!(stats.min_intensity, 40.0);
        assert_eq!(stats.max_intensity, 70.0);
        assert_eq!(stats.global_range, IntensityRange::around(40.0, 70.0, 10.0));
        assert_eq!(stats.voxel_count, 3);
        assert_eq!(stats.extent, 1);
    }

    #[test]
    fn test_ties_resolve_to_first_voxel() {
        let volume = VoxelGrid::new(Array3::from_elem((4, 4, 4), 9.0));
        let seeds = LabelMask::from_voxels((4, 4, 4), [Voxel::new(2, 0, 0), Voxel::new(1, 3, 3)]).unwrap();

        let stats = SeedStatistics::compute(&volume, &seeds, 1.0).unwrap();
        assert_eq!(stats.seed, Voxel::new(1, 3, 3));
        assert_eq!(stats.extent, 3);
    }

    #[test]
    fn test_empty_seed_set() {
        let volume = VoxelGrid::new(Array3::zeros((3, 3, 3)));
        let seeds = LabelMask::zeros((3, 3, 3));
        assert!(matches!(
            SeedStatistics::compute(&volume, &seeds, 5.0),
            Err(SegmentError::EmptySeedSet)
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let volume = VoxelGrid::new(Array3::zeros((3, 3, 3)));
        let seeds = LabelMask::from_voxels((3, 3, 4), [Voxel::new(0, 0, 0)]).unwrap();
        assert!(matches!(
            SeedStatistics::compute(&volume, &seeds, 5.0),
            Err(SegmentError::InvalidInput(_))
        ));
    }
}
