//! Per-slice refinement of a grown mask.
//!
//! Every slice along the first axis is replaced by the filled convex hull of
//! its on-pixels, smoothed with a morphological opening and then a closing.
//! Slices are independent and are refined in parallel.
//!
//! All steps work in the slice's own `(row, col)` frame, so a refined slice
//! is written back without any rotation or flip.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use super::hull::{convex_hull, fill_convex, Pixel};
use super::morphology::{self, StructuringElement};
use crate::error::{SegmentError, SegmentResult};
use crate::volume::LabelMask;

/// Hull and morphology capability used by [`SliceRefiner`].
pub trait SliceGeometry: Send + Sync {
    /// Filled convex hull of the on-pixels of a binary slice.
    ///
    /// Fails with [`SegmentError::DegenerateSlice`] below three on-pixels.
    fn fill_hull(&self, slice: ArrayView2<u8>) -> SegmentResult<Array2<u8>>;

    fn open(&self, slice: ArrayView2<u8>) -> Array2<u8>;

    fn close(&self, slice: ArrayView2<u8>) -> Array2<u8>;
}

/// Exact integer hull with a fixed structuring element.
#[derive(Clone, Debug, Default)]
pub struct RasterGeometry {
    element: StructuringElement,
}

impl RasterGeometry {
    pub fn new(element: StructuringElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &StructuringElement {
        &self.element
    }
}

impl SliceGeometry for RasterGeometry {
    fn fill_hull(&self, slice: ArrayView2<u8>) -> SegmentResult<Array2<u8>> {
        let pixels: Vec<Pixel> = slice
            .indexed_iter()
            .filter(|(_, &v)| v != 0)
            .map(|((row, col), _)| Pixel::new(row as i64, col as i64))
            .collect();
        if pixels.len() < 3 {
            return Err(SegmentError::DegenerateSlice { pixels: pixels.len() });
        }

        let hull = convex_hull(&pixels);
        Ok(fill_convex(&hull, slice.dim()))
    }

    fn open(&self, slice: ArrayView2<u8>) -> Array2<u8> {
        morphology::open(slice, &self.element)
    }

    fn close(&self, slice: ArrayView2<u8>) -> Array2<u8> {
        morphology::close(slice, &self.element)
    }
}

/// What happened to one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOutcome {
    /// No on-pixels; left untouched.
    Empty,
    /// Too few on-pixels for a hull; binarized only.
    Degenerate { pixels: usize },
    Refined,
}

/// Slice tallies of one refinement run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefineReport {
    pub refined: usize,
    pub empty: usize,
    pub degenerate: usize,
}

impl RefineReport {
    fn record(&mut self, outcome: SliceOutcome) {
        match outcome {
            SliceOutcome::Empty => self.empty += 1,
            SliceOutcome::Degenerate { .. } => self.degenerate += 1,
            SliceOutcome::Refined => self.refined += 1,
        }
    }
}

/// Refines a mask slice by slice with an injected [`SliceGeometry`].
#[derive(Clone, Debug, Default)]
pub struct SliceRefiner<G = RasterGeometry> {
    geometry: G,
}

impl<G: SliceGeometry> SliceRefiner<G> {
    pub fn new(geometry: G) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Refine one slice, returning the new slice and what was done to it.
    ///
    /// Degenerate slices are recovered here and never surface as errors.
    pub fn refine_slice(&self, slice: ArrayView2<u8>) -> SegmentResult<(Array2<u8>, SliceOutcome)> {
        let binary = slice.mapv(|v| u8::from(v != 0));
        if binary.iter().all(|&v| v == 0) {
            return Ok((binary, SliceOutcome::Empty));
        }

        let filled = match self.geometry.fill_hull(binary.view()) {
            Ok(filled) => filled,
            Err(SegmentError::DegenerateSlice { pixels }) => {
                return Ok((binary, SliceOutcome::Degenerate { pixels }));
            }
            Err(err) => return Err(err),
        };

        let opened = self.geometry.open(filled.view());
        let closed = self.geometry.close(opened.view());
        Ok((closed.mapv(|v| u8::from(v != 0)), SliceOutcome::Refined))
    }

    /// Refine every slice of `mask` along the first axis in place.
    pub fn refine(&self, mask: &mut LabelMask) -> SegmentResult<RefineReport> {
        let refined = (0..mask.slice_count())
            .into_par_iter()
            .map(|index| -> SegmentResult<_> {
                let (slice, outcome) = self.refine_slice(mask.slice(index)?)?;
                Ok((index, slice, outcome))
            })
            .collect::<SegmentResult<Vec<_>>>()?;

        let mut report = RefineReport::default();
        for (index, slice, outcome) in refined {
            report.record(outcome);
            match outcome {
                SliceOutcome::Empty => continue,
                SliceOutcome::Degenerate { pixels } => {
                    debug!(slice = index, pixels, "slice too sparse for a hull, kept as is");
                }
                SliceOutcome::Refined => {}
            }
            mask.write_slice(index, &slice)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Voxel;
    use std::collections::VecDeque;

    fn rectangle(shape: (usize, usize), rows: (usize, usize), cols: (usize, usize)) -> Array2<u8> {
        Array2::from_shape_fn(shape, |(r, c)| {
            u8::from(rows.0 <= r && r <= rows.1 && cols.0 <= c && c <= cols.1)
        })
    }

    /// Every off-pixel is 4-connected to the image border through off-pixels.
    fn has_no_holes(image: &Array2<u8>) -> bool {
        let (height, width) = image.dim();
        let mut seen = Array2::<bool>::from_elem((height, width), false);
        let mut queue = VecDeque::new();
        for ((r, c), &v) in image.indexed_iter() {
            let border = r == 0 || c == 0 || r == height - 1 || c == width - 1;
            if border && v == 0 {
                seen[[r, c]] = true;
                queue.push_back((r, c));
            }
        }
        while let Some((r, c)) = queue.pop_front() {
            let neighbors = [
                (r.wrapping_sub(1), c),
                (r + 1, c),
                (r, c.wrapping_sub(1)),
                (r, c + 1),
            ];
            for (nr, nc) in neighbors {
                if nr < height && nc < width && image[[nr, nc]] == 0 && !seen[[nr, nc]] {
                    seen[[nr, nc]] = true;
                    queue.push_back((nr, nc));
                }
            }
        }
        image.indexed_iter().all(|(index, &v)| v != 0 || seen[index])
    }

    #[test]
    fn test_empty_slice_is_untouched() {
        let refiner = SliceRefiner::<RasterGeometry>::default();
        let (slice, outcome) = refiner.refine_slice(Array2::zeros((6, 6)).view()).unwrap();
        assert_eq!(outcome, SliceOutcome::Empty);
        assert_eq!(slice.sum(), 0);
    }

    #[test]
    fn test_degenerate_slice_is_binarized() {
        let mut input = Array2::<u8>::zeros((6, 6));
        input[[1, 1]] = 200;
        input[[4, 2]] = 3;

        let refiner = SliceRefiner::<RasterGeometry>::default();
        let (slice, outcome) = refiner.refine_slice(input.view()).unwrap();
        assert_eq!(outcome, SliceOutcome::Degenerate { pixels: 2 });
        assert_eq!(slice[[1, 1]], 1);
        assert_eq!(slice[[4, 2]], 1);
        assert_eq!(slice.sum(), 2);
    }

    #[test]
    fn test_rectangle_loses_corner_pixels() {
        let input = rectangle((20, 20), (5, 14), (5, 14));
        let refiner = SliceRefiner::<RasterGeometry>::default();
        let (slice, outcome) = refiner.refine_slice(input.view()).unwrap();

        assert_eq!(outcome, SliceOutcome::Refined);
        assert_eq!(slice.sum(), 92);
        assert_eq!(slice[[5, 5]], 0);
        assert_eq!(slice[[5, 6]], 0);
        assert_eq!(slice[[6, 5]], 1);
        assert_eq!(slice[[14, 13]], 0);
        assert_eq!(slice[[13, 14]], 1);

        let (again, _) = refiner.refine_slice(slice.view()).unwrap();
        assert_eq!(again, slice);
    }

    #[test]
    fn test_l_shape_fills_without_moving() {
        // Vertical bar down the left, foot along the bottom
        let mut input = rectangle((20, 20), (4, 15), (4, 7));
        input.zip_mut_with(&rectangle((20, 20), (12, 15), (8, 15)), |a, &b| *a |= b);
        let l_count = input.sum() as usize;
        assert_eq!(l_count, 80);

        let refiner = SliceRefiner::<RasterGeometry>::default();
        let (slice, outcome) = refiner.refine_slice(input.view()).unwrap();
        assert_eq!(outcome, SliceOutcome::Refined);
        assert!(slice.iter().filter(|&&v| v != 0).count() >= l_count);
        assert!(has_no_holes(&slice));

        // Notch between the bar and the foot is filled
        assert_eq!(slice[[10, 10]], 1);
        // Shape keeps its orientation: bar at the left, foot at the bottom
        assert_eq!(slice[[8, 5]], 1);
        assert_eq!(slice[[14, 14]], 1);
        assert_eq!(slice[[5, 14]], 0);
        assert_eq!(slice[[8, 14]], 0);
    }

    #[test]
    fn test_refine_mask_reports_each_slice() {
        let mut mask = LabelMask::zeros((3, 20, 20));
        mask.set(Voxel::new(1, 3, 3), true).unwrap();
        mask.set(Voxel::new(1, 9, 12), true).unwrap();
        mask.write_slice(2, &rectangle((20, 20), (5, 14), (5, 14))).unwrap();

        let refiner = SliceRefiner::<RasterGeometry>::default();
        let report = refiner.refine(&mut mask).unwrap();
        assert_eq!(
            report,
            RefineReport {
                refined: 1,
                empty: 1,
                degenerate: 1,
            }
        );
        assert_eq!(mask.slice(0).unwrap().sum(), 0);
        assert_eq!(mask.slice(1).unwrap().sum(), 2);
        assert_eq!(mask.slice(2).unwrap().sum(), 92);

        // A refined mask is a fixed point
        let before = mask.clone();
        refiner.refine(&mut mask).unwrap();
        assert_eq!(mask, before);
    }

    struct HullOnly;

    impl SliceGeometry for HullOnly {
        fn fill_hull(&self, slice: ArrayView2<u8>) -> SegmentResult<Array2<u8>> {
            RasterGeometry::default().fill_hull(slice)
        }

        fn open(&self, slice: ArrayView2<u8>) -> Array2<u8> {
            slice.to_owned()
        }

        fn close(&self, slice: ArrayView2<u8>) -> Array2<u8> {
            slice.to_owned()
        }
    }

    #[test]
    fn test_geometry_is_injected() {
        let input = rectangle((20, 20), (5, 14), (5, 14));
        let refiner = SliceRefiner::new(HullOnly);
        let (slice, outcome) = refiner.refine_slice(input.view()).unwrap();
        assert_eq!(outcome, SliceOutcome::Refined);
        assert_eq!(slice, input);
    }
}
