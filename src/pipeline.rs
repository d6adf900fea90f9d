//! End-to-end segmentation: validate, grow, refine, paint.

use std::sync::atomic::AtomicBool;

use ndarray::Array3;
use tracing::info;

use crate::error::{SegmentError, SegmentResult};
use crate::growing::{GrownRegion, GrowthReport, GrowthSchedule, RegionGrower};
use crate::refine::{RasterGeometry, RefineReport, SliceGeometry, SliceRefiner, StructuringElement};
use crate::volume::{LabelMask, VoxelGrid};

/// Default intensity compensation.
pub const DEFAULT_COMPENSATE: f32 = 11.0;

/// Default display value written into the painted volume.
pub const DEFAULT_HIGHLIGHT: f32 = 100.0;

/// Parameters of one segmentation run.
#[derive(Clone, Debug)]
pub struct SegmentParams {
    /// Margin added on both sides of the global and local intensity bands.
    pub compensate: f32,
    /// Value painted into occupied voxels of the output volume.
    pub highlight: f32,
    pub schedule: GrowthSchedule,
    /// Run slice refinement after growth.
    pub refine: bool,
    /// Structuring element of the default slice geometry.
    pub element: StructuringElement,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            compensate: DEFAULT_COMPENSATE,
            highlight: DEFAULT_HIGHLIGHT,
            schedule: GrowthSchedule::InPlace,
            refine: true,
            element: StructuringElement::default(),
        }
    }
}

impl SegmentParams {
    #[must_use]
    pub fn with_compensate(mut self, compensate: f32) -> Self {
        self.compensate = compensate;
        self
    }

    #[must_use]
    pub fn with_highlight(mut self, highlight: f32) -> Self {
        self.highlight = highlight;
        self
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: GrowthSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    #[must_use]
    pub fn with_element(mut self, element: StructuringElement) -> Self {
        self.element = element;
        self
    }

    pub fn validate(&self) -> SegmentResult<()> {
        if !self.compensate.is_finite() || self.compensate < 0.0 {
            return Err(SegmentError::InvalidInput(format!(
                "compensate must be finite and non-negative, got {}",
                self.compensate
            )));
        }
        if !self.highlight.is_finite() {
            return Err(SegmentError::InvalidInput(format!(
                "highlight must be finite, got {}",
                self.highlight
            )));
        }
        Ok(())
    }
}

/// Parameters handed to the mesh generator along with a label volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelRequest {
    /// Label id of the segmented structure, at least 1.
    pub label: u8,
    /// Smoothing strength in `1..=60`.
    pub smoothing: u32,
    /// Fraction of triangles to remove, in `[0, 1)`.
    pub decimate: f32,
}

impl Default for ModelRequest {
    fn default() -> Self {
        Self {
            label: 1,
            smoothing: 10,
            decimate: 0.25,
        }
    }
}

impl ModelRequest {
    #[must_use]
    pub const fn with_label(mut self, label: u8) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub const fn with_smoothing(mut self, smoothing: u32) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub const fn with_decimate(mut self, decimate: f32) -> Self {
        self.decimate = decimate;
        self
    }

    pub fn validate(&self) -> SegmentResult<()> {
        if self.label == 0 {
            return Err(SegmentError::InvalidInput("model label must be at least 1".into()));
        }
        if !(1..=60).contains(&self.smoothing) {
            return Err(SegmentError::InvalidInput(format!(
                "smoothing must be in 1..=60, got {}",
                self.smoothing
            )));
        }
        if !(0.0..1.0).contains(&self.decimate) {
            return Err(SegmentError::InvalidInput(format!(
                "decimate must be in [0, 1), got {}",
                self.decimate
            )));
        }
        Ok(())
    }
}

/// Result of a segmentation run.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// Refined binary mask.
    pub mask: LabelMask,
    /// Input volume with occupied voxels set to the highlight value.
    pub painted: VoxelGrid,
    pub growth: GrowthReport,
    /// `None` when refinement was disabled.
    pub refinement: Option<RefineReport>,
}

impl Segmentation {
    /// Label volume with occupied voxels set to `label`.
    pub fn label_map(&self, label: u8) -> Array3<u8> {
        self.mask.label_map(label)
    }

    /// Validated label volume for a mesh-generation request.
    pub fn model_input(&self, request: &ModelRequest) -> SegmentResult<Array3<u8>> {
        request.validate()?;
        Ok(self.label_map(request.label))
    }
}

/// Grows a region from seeds and refines it slice by slice.
#[derive(Clone, Debug)]
pub struct SegmentationPipeline<G = RasterGeometry> {
    params: SegmentParams,
    refiner: SliceRefiner<G>,
}

impl SegmentationPipeline<RasterGeometry> {
    pub fn new(params: SegmentParams) -> Self {
        let geometry = RasterGeometry::new(params.element.clone());
        Self::with_geometry(params, geometry)
    }
}

impl Default for SegmentationPipeline<RasterGeometry> {
    fn default() -> Self {
        Self::new(SegmentParams::default())
    }
}

impl<G: SliceGeometry> SegmentationPipeline<G> {
    /// Pipeline refining slices with `geometry` instead of the default one.
    pub fn with_geometry(params: SegmentParams, geometry: G) -> Self {
        Self {
            params,
            refiner: SliceRefiner::new(geometry),
        }
    }

    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// Run to completion.
    pub fn run(&self, volume: &VoxelGrid, seeds: &LabelMask) -> SegmentResult<Segmentation> {
        self.run_with(volume, seeds, None)
    }

    /// Run, stopping growth early once `cancel` is raised.
    ///
    /// A cancelled run is still refined and painted from the voxels grown
    /// before the flag was seen.
    pub fn run_until(&self, volume: &VoxelGrid, seeds: &LabelMask, cancel: &AtomicBool) -> SegmentResult<Segmentation> {
        self.run_with(volume, seeds, Some(cancel))
    }

    fn run_with(&self, volume: &VoxelGrid, seeds: &LabelMask, cancel: Option<&AtomicBool>) -> SegmentResult<Segmentation> {
        self.params.validate()?;
        if volume.dimensions() != seeds.dimensions() {
            return Err(SegmentError::InvalidInput(format!(
                "seed mask dimensions {:?} differ from volume dimensions {:?}",
                seeds.dimensions(),
                volume.dimensions()
            )));
        }
        if seeds.is_empty() {
            return Err(SegmentError::InvalidInput("seed mask has no marked voxels".into()));
        }

        let (dx, dy, dz) = volume.dimensions();
        info!(dx, dy, dz, seeds = seeds.count(), compensate = self.params.compensate, "segmentation started");

        let grower = RegionGrower::new(self.params.compensate).with_schedule(self.params.schedule);
        let growth = grower.start(volume, seeds)?;
        let GrownRegion { mut mask, report } = match cancel {
            Some(flag) => growth.run_until(flag)?,
            None => growth.run()?,
        };

        let refinement = if self.params.refine {
            Some(self.refiner.refine(&mut mask)?)
        } else {
            None
        };

        let painted = volume.painted(&mask, self.params.highlight)?;
        info!(
            termination = ?report.termination,
            passes = report.passes,
            grown = report.grown_voxels(),
            occupied = mask.count(),
            "segmentation finished"
        );

        Ok(Segmentation {
            mask,
            painted,
            growth: report,
            refinement,
        })
    }
}

/// Segment with default parameters and the given compensation.
pub fn segment(volume: &VoxelGrid, seeds: &LabelMask, compensate: f32) -> SegmentResult<Segmentation> {
    SegmentationPipeline::new(SegmentParams::default().with_compensate(compensate)).run(volume, seeds)
}
