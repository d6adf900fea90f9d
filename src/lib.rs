//! VoxelCut
//!
//! Seed-driven segmentation of 3D scalar volumes (CT, MRI) with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Pipeline
//! 1. A binary seed mask marks part of the structure of interest.
//! 2. [`growing`] expands it shell by shell around the brightest seed voxel,
//!    admitting voxels whose intensity fits both the seed band and the band
//!    of their already-grown neighbors.
//! 3. [`refine`] replaces every slice along the first axis by its filled
//!    convex hull, smoothed by a morphological opening and closing.
//! 4. [`pipeline`] ties both together and paints the result into a copy of
//!    the volume for display.
//!
//! ## Volume Format
//! Volumes are `(x, y, z)` arrays of `f32` intensities; `i16` CT data is
//! converted on entry. Masks are `(x, y, z)` arrays of `u8`, where any
//! non-zero value marks an occupied voxel.
//!
//! ## Logging
//! Progress is reported through `tracing`. The library installs no
//! subscriber; Python callers can use `init_logging`.

pub mod error;
pub mod growing;
pub mod pipeline;
pub mod refine;
pub mod selection;
pub mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{SegmentError, SegmentResult};
pub use growing::{GrowthReport, GrowthSchedule, RegionGrower, Termination};
pub use pipeline::{segment, ModelRequest, SegmentParams, Segmentation, SegmentationPipeline};
pub use refine::{RefineReport, SliceGeometry, SliceRefiner};
pub use volume::{LabelMask, Voxel, VoxelGrid};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use tracing_subscriber::EnvFilter;

    use crate::error::SegmentError;
    use crate::growing::{shell, GrowthSchedule, RegionGrower};
    use crate::pipeline::{SegmentParams, Segmentation, SegmentationPipeline, DEFAULT_COMPENSATE, DEFAULT_HIGHLIGHT};
    use crate::refine::{RasterGeometry, SliceRefiner};
    use crate::volume::{LabelMask, Voxel, VoxelGrid};

    impl From<SegmentError> for PyErr {
        fn from(err: SegmentError) -> Self {
            PyValueError::new_err(err.to_string())
        }
    }

    fn schedule(barrier: bool) -> GrowthSchedule {
        if barrier {
            GrowthSchedule::Barrier
        } else {
            GrowthSchedule::InPlace
        }
    }

    type SegmentOutput<'py> = (Bound<'py, PyArray3<u8>>, Bound<'py, PyArray3<f32>>, &'static str, usize);

    fn run_pipeline<'py>(
        py: Python<'py>,
        volume: VoxelGrid,
        seeds: LabelMask,
        params: SegmentParams,
    ) -> PyResult<SegmentOutput<'py>> {
        let result: Segmentation = py.allow_threads(|| SegmentationPipeline::new(params).run(&volume, &seeds))?;
        Ok((
            result.mask.into_array().into_pyarray(py),
            result.painted.into_array().into_pyarray(py),
            result.growth.termination.as_str(),
            result.growth.passes,
        ))
    }

    // ========================================================================
    // Segmentation
    // ========================================================================

    /// Segment a float volume from a seed mask.
    ///
    /// # Arguments
    /// * `volume` - Intensities, shape (x, y, z)
    /// * `seeds` - Seed mask of the same shape, non-zero marks a seed
    /// * `compensate` - Margin around the seed and neighbor intensity bands
    /// * `highlight` - Value painted into segmented voxels
    /// * `refine` - Apply per-slice hull and morphology cleanup
    /// * `barrier` - Evaluate each growth pass in parallel
    ///
    /// # Returns
    /// `(mask, painted, termination, passes)`
    #[pyfunction]
    #[pyo3(signature = (volume, seeds, compensate=DEFAULT_COMPENSATE, highlight=DEFAULT_HIGHLIGHT, refine=true, barrier=false))]
    pub fn segment<'py>(
        py: Python<'py>,
        volume: PyReadonlyArray3<'py, f32>,
        seeds: PyReadonlyArray3<'py, u8>,
        compensate: f32,
        highlight: f32,
        refine: bool,
        barrier: bool,
    ) -> PyResult<SegmentOutput<'py>> {
        let params = SegmentParams::default()
            .with_compensate(compensate)
            .with_highlight(highlight)
            .with_refine(refine)
            .with_schedule(schedule(barrier));
        let volume = VoxelGrid::new(volume.as_array().to_owned());
        let seeds = LabelMask::from_array(seeds.as_array().to_owned());
        run_pipeline(py, volume, seeds, params)
    }

    /// Segment a 16-bit CT volume from a seed mask.
    ///
    /// Same arguments and result as `segment`; the painted volume is float.
    #[pyfunction]
    #[pyo3(signature = (volume, seeds, compensate=DEFAULT_COMPENSATE, highlight=DEFAULT_HIGHLIGHT, refine=true, barrier=false))]
    pub fn segment_i16<'py>(
        py: Python<'py>,
        volume: PyReadonlyArray3<'py, i16>,
        seeds: PyReadonlyArray3<'py, u8>,
        compensate: f32,
        highlight: f32,
        refine: bool,
        barrier: bool,
    ) -> PyResult<SegmentOutput<'py>> {
        let params = SegmentParams::default()
            .with_compensate(compensate)
            .with_highlight(highlight)
            .with_refine(refine)
            .with_schedule(schedule(barrier));
        let volume = VoxelGrid::from_i16(volume.as_array());
        let seeds = LabelMask::from_array(seeds.as_array().to_owned());
        run_pipeline(py, volume, seeds, params)
    }

    // ========================================================================
    // Individual stages
    // ========================================================================

    /// Grow a region without slice refinement.
    ///
    /// # Returns
    /// `(mask, termination, passes)`
    #[pyfunction]
    #[pyo3(signature = (volume, seeds, compensate=DEFAULT_COMPENSATE, barrier=false))]
    pub fn grow_region<'py>(
        py: Python<'py>,
        volume: PyReadonlyArray3<'py, f32>,
        seeds: PyReadonlyArray3<'py, u8>,
        compensate: f32,
        barrier: bool,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, &'static str, usize)> {
        SegmentParams::default().with_compensate(compensate).validate()?;
        let volume = VoxelGrid::new(volume.as_array().to_owned());
        let seeds = LabelMask::from_array(seeds.as_array().to_owned());
        let grower = RegionGrower::new(compensate).with_schedule(schedule(barrier));

        let grown = py.allow_threads(|| grower.grow(&volume, &seeds))?;
        Ok((
            grown.mask.into_array().into_pyarray(py),
            grown.report.termination.as_str(),
            grown.report.passes,
        ))
    }

    /// Refine every slice along the first axis of a mask.
    #[pyfunction]
    pub fn refine_mask<'py>(py: Python<'py>, mask: PyReadonlyArray3<'py, u8>) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let mut mask = LabelMask::from_array(mask.as_array().to_owned());
        py.allow_threads(|| SliceRefiner::<RasterGeometry>::default().refine(&mut mask))?;
        Ok(mask.into_array().into_pyarray(py))
    }

    /// Voxels of the cube shell of `radius` around `center`.
    #[pyfunction]
    pub fn shell_voxels(center: (isize, isize, isize), radius: usize) -> Vec<(isize, isize, isize)> {
        let (x, y, z) = center;
        shell(Voxel::new(x, y, z), radius).map(|v| (v.x, v.y, v.z)).collect()
    }

    /// Print `tracing` output to stderr, filtered like `RUST_LOG`.
    #[pyfunction]
    #[pyo3(signature = (filter="info"))]
    pub fn init_logging(filter: &str) -> PyResult<()> {
        let filter = EnvFilter::try_new(filter).map_err(|e| PyValueError::new_err(e.to_string()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    #[pymodule]
    pub fn voxelcut(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Segmentation
        m.add_function(wrap_pyfunction!(segment, m)?)?;
        m.add_function(wrap_pyfunction!(segment_i16, m)?)?;

        // Individual stages
        m.add_function(wrap_pyfunction!(grow_region, m)?)?;
        m.add_function(wrap_pyfunction!(refine_mask, m)?)?;
        m.add_function(wrap_pyfunction!(shell_voxels, m)?)?;

        m.add_function(wrap_pyfunction!(init_logging, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::voxelcut;
