//! Intensity-gated region growing over cube-shaped shells.
//!
//! Growth proceeds one shell at a time around the brightest seed voxel. A
//! candidate on the current shell joins the region when
//!
//! 1. its intensity lies strictly inside the global seed band,
//! 2. at least two voxels of its 3x3x3 neighborhood are already occupied, and
//! 3. its intensity lies strictly inside the band spanned by those occupied
//!    neighbors, widened by the same compensation.
//!
//! The local band lets the admissible intensities drift with gradual
//! gradients while the global band keeps them anchored to the seed.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use super::seed::{IntensityRange, SeedStatistics};
use super::shell::shell;
use crate::error::{SegmentError, SegmentResult};
use crate::volume::{touches_boundary, LabelMask, Voxel, VoxelGrid};

/// Half-width of the neighborhood consulted for each candidate.
pub const SEARCH_RADIUS: usize = 1;

/// Why growth stopped. All variants are normal outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// A pass added nothing beyond the seed's extent; later shells cannot
    /// gain support.
    Converged,
    /// The next shell's neighborhoods would touch the grid's outer layer.
    BoundaryReached,
    /// No voxel on the next shell lies inside the global band.
    NoNewVoxels,
    /// The caller's cancel flag was raised between passes.
    Cancelled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::BoundaryReached => "boundary_reached",
            Termination::NoNewVoxels => "no_new_voxels",
            Termination::Cancelled => "cancelled",
        }
    }
}

/// Position of a [`Growth`] in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    Initializing,
    /// `radius` is the last shell evaluated.
    Growing { radius: usize },
    Finished(Termination),
}

/// How writes within one pass become visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthSchedule {
    /// Candidates are visited in shell order and see earlier writes of the
    /// same pass.
    #[default]
    InPlace,
    /// Candidates are evaluated in parallel against the mask as it stood at
    /// the end of the previous pass; writes land together afterwards.
    Barrier,
}

/// Summary of a finished growth run.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowthReport {
    pub termination: Termination,
    /// Number of shells evaluated.
    pub passes: usize,
    pub seed: SeedStatistics,
    /// Occupied count after initialization, then after each pass.
    pub occupied_history: Vec<usize>,
}

impl GrowthReport {
    /// Voxels added on top of the seed mask.
    pub fn grown_voxels(&self) -> usize {
        let last = self.occupied_history.last().copied().unwrap_or(0);
        last.saturating_sub(self.seed.voxel_count)
    }
}

/// Grown mask plus the report describing how it was produced.
#[derive(Clone, Debug)]
pub struct GrownRegion {
    pub mask: LabelMask,
    pub report: GrowthReport,
}

/// Growth configuration.
#[derive(Clone, Copy, Debug)]
pub struct RegionGrower {
    compensate: f32,
    schedule: GrowthSchedule,
}

impl RegionGrower {
    pub fn new(compensate: f32) -> Self {
        Self {
            compensate,
            schedule: GrowthSchedule::default(),
        }
    }

    #[must_use]
    pub const fn with_schedule(mut self, schedule: GrowthSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn compensate(&self) -> f32 {
        self.compensate
    }

    pub fn schedule(&self) -> GrowthSchedule {
        self.schedule
    }

    /// Initialize a steppable growth run.
    pub fn start<'a>(&self, volume: &'a VoxelGrid, seeds: &LabelMask) -> SegmentResult<Growth<'a>> {
        Growth::new(volume, seeds, *self)
    }

    /// Grow to a terminal state.
    pub fn grow(&self, volume: &VoxelGrid, seeds: &LabelMask) -> SegmentResult<GrownRegion> {
        self.start(volume, seeds)?.run()
    }
}

/// An in-progress growth run over one volume.
pub struct Growth<'a> {
    volume: &'a VoxelGrid,
    config: RegionGrower,
    stats: SeedStatistics,
    mask: LabelMask,
    passes: usize,
    state: GrowthState,
    history: Vec<usize>,
}

impl<'a> Growth<'a> {
    fn new(volume: &'a VoxelGrid, seeds: &LabelMask, config: RegionGrower) -> SegmentResult<Self> {
        let stats = SeedStatistics::compute(volume, seeds, config.compensate)?;
        let mask = seeds.clone();
        let history = vec![mask.count()];
        debug!(
            seed = %stats.seed,
            lower = stats.global_range.lower,
            upper = stats.global_range.upper,
            seeds = stats.voxel_count,
            "growth initialized"
        );
        Ok(Self {
            volume,
            config,
            stats,
            mask,
            passes: 0,
            state: GrowthState::Initializing,
            history,
        })
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn statistics(&self) -> &SeedStatistics {
        &self.stats
    }

    /// Mask as grown so far.
    pub fn mask(&self) -> &LabelMask {
        &self.mask
    }

    /// Evaluate the next shell. Finished runs are left untouched.
    pub fn step(&mut self) -> SegmentResult<GrowthState> {
        if let GrowthState::Finished(_) = self.state {
            return Ok(self.state);
        }

        let radius = self.passes + 1;
        if touches_boundary(self.stats.seed, radius + SEARCH_RADIUS, self.volume.dimensions()) {
            return Ok(self.stop(Termination::BoundaryReached));
        }

        let global = self.stats.global_range;
        let mut candidates = Vec::new();
        for voxel in shell(self.stats.seed, radius) {
            if global.contains(self.volume.get(voxel)?) {
                candidates.push(voxel);
            }
        }
        if candidates.is_empty() {
            return Ok(self.stop(Termination::NoNewVoxels));
        }

        let added = match self.config.schedule {
            GrowthSchedule::InPlace => self.grow_in_place(&candidates)?,
            GrowthSchedule::Barrier => self.grow_barrier(&candidates)?,
        };

        self.passes = radius;
        let occupied = self.history.last().copied().unwrap_or(0) + added;
        self.history.push(occupied);
        debug!(radius, candidates = candidates.len(), added, occupied, "growth pass");

        if added == 0 && radius > self.stats.extent {
            return Ok(self.stop(Termination::Converged));
        }
        self.state = GrowthState::Growing { radius };
        Ok(self.state)
    }

    /// Step until a terminal state.
    pub fn run(mut self) -> SegmentResult<GrownRegion> {
        while !matches!(self.step()?, GrowthState::Finished(_)) {}
        Ok(self.finish())
    }

    /// Step until a terminal state or until `cancel` is raised.
    ///
    /// The flag is read between passes; a cancelled run keeps every voxel
    /// grown so far.
    pub fn run_until(mut self, cancel: &AtomicBool) -> SegmentResult<GrownRegion> {
        loop {
            if cancel.load(Ordering::Relaxed) {
                warn!(passes = self.passes, "growth cancelled");
                self.stop(Termination::Cancelled);
                break;
            }
            if let GrowthState::Finished(_) = self.step()? {
                break;
            }
        }
        Ok(self.finish())
    }

    /// Consume the run. An unfinished run reports `Cancelled`.
    pub fn finish(self) -> GrownRegion {
        let termination = match self.state {
            GrowthState::Finished(termination) => termination,
            _ => Termination::Cancelled,
        };
        GrownRegion {
            mask: self.mask,
            report: GrowthReport {
                termination,
                passes: self.passes,
                seed: self.stats,
                occupied_history: self.history,
            },
        }
    }

    fn stop(&mut self, termination: Termination) -> GrowthState {
        self.state = GrowthState::Finished(termination);
        self.state
    }

    fn grow_in_place(&mut self, candidates: &[Voxel]) -> SegmentResult<usize> {
        let mut added = 0;
        for &voxel in candidates {
            if self.mask.get(voxel)? {
                continue;
            }
            if admissible(self.volume, &self.mask, voxel, self.config.compensate)? {
                self.mask.set(voxel, true)?;
                added += 1;
            }
        }
        Ok(added)
    }

    fn grow_barrier(&mut self, candidates: &[Voxel]) -> SegmentResult<usize> {
        let volume = self.volume;
        let mask = &self.mask;
        let compensate = self.config.compensate;

        let accepted = candidates
            .par_iter()
            .map(|&voxel| -> SegmentResult<Option<Voxel>> {
                if mask.get(voxel)? {
                    return Ok(None);
                }
                Ok(admissible(volume, mask, voxel, compensate)?.then_some(voxel))
            })
            .collect::<SegmentResult<Vec<Option<Voxel>>>>()?;

        let mut added = 0;
        for voxel in accepted.into_iter().flatten() {
            self.mask.set(voxel, true)?;
            added += 1;
        }
        Ok(added)
    }
}

/// Local-support and local-band check for one candidate.
fn admissible(volume: &VoxelGrid, mask: &LabelMask, voxel: Voxel, compensate: f32) -> SegmentResult<bool> {
    let flags = mask.extract_sub_block(voxel, SEARCH_RADIUS)?;
    let support = flags.iter().filter(|&&flag| flag != 0).count();
    if support <= 1 {
        return Ok(false);
    }

    let patch = volume.extract_sub_block(voxel, SEARCH_RADIUS)?;
    debug_assert_eq!(patch.dim(), flags.dim());

    let (local_min, local_max) = patch
        .iter()
        .zip(flags.iter())
        .filter(|(_, &flag)| flag != 0)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (&value, _)| {
            (lo.min(value), hi.max(value))
        });

    let local = IntensityRange::around(local_min, local_max, compensate);
    Ok(local.contains(volume.get(voxel)?))
}
