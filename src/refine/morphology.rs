//! Binary morphology on single slices: Erode, Dilate, Open, Close.
//!
//! Images are `(rows, cols)` arrays of 0/1 flags. Pixels outside the image
//! are ignored by both primitives: they never block an erosion and never
//! feed a dilation. With that border rule erosion and dilation stay adjoint,
//! so opening and closing are idempotent. This matches OpenCV's default
//! border handling for binary morphology.
//!
//! The rule is visible near the edge: a closing can turn on pixels outside
//! the input shape when the shape lies within the element's reach of the
//! border, because the missing pixels beyond the edge cannot erode them
//! away again. A 5x5 ellipse two pixels from the right edge closes to a
//! shape whose middle row runs out to the border.
//!
//! Rows are processed in parallel with Rayon.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView2, Axis};

/// Set of `(row, col)` offsets relative to the element's anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    offsets: Vec<(isize, isize)>,
    size: (usize, usize),
}

impl StructuringElement {
    /// Elliptic element inscribed in a `width` x `height` box, rasterized the
    /// way OpenCV's `MORPH_ELLIPSE` does. The anchor is the box center.
    ///
    /// The 5x5 element is
    ///
    /// ```text
    /// ..#..
    /// #####
    /// #####
    /// #####
    /// ..#..
    /// ```
    pub fn ellipse(width: usize, height: usize) -> Self {
        let r = (height / 2) as isize;
        let c = (width / 2) as isize;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut offsets = Vec::new();
        for i in 0..height as isize {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = if r > 0 {
                (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as isize
            } else {
                c
            };
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(width as isize);
            for j in j1..j2 {
                offsets.push((dy, j - c));
            }
        }

        Self {
            offsets,
            size: (height, width),
        }
    }

    /// Full rectangle of `width` x `height`.
    pub fn rect(width: usize, height: usize) -> Self {
        let r = (height / 2) as isize;
        let c = (width / 2) as isize;
        let offsets = (0..height as isize)
            .flat_map(|i| (0..width as isize).map(move |j| (i - r, j - c)))
            .collect();
        Self {
            offsets,
            size: (height, width),
        }
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// Bounding box as `(rows, cols)`.
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    /// The element as a 0/1 image of its bounding box.
    pub fn to_image(&self) -> Array2<u8> {
        let (rows, cols) = self.size;
        let mut image = Array2::zeros((rows, cols));
        let (r, c) = ((rows / 2) as isize, (cols / 2) as isize);
        for &(dy, dx) in &self.offsets {
            image[[(dy + r) as usize, (dx + c) as usize]] = 1;
        }
        image
    }
}

impl Default for StructuringElement {
    fn default() -> Self {
        Self::ellipse(5, 5)
    }
}

// ============================================================================
// Erode / Dilate
// ============================================================================

/// Apply erosion.
///
/// A pixel stays on only if every in-bounds pixel under the element is on.
pub fn erode(input: ArrayView2<u8>, element: &StructuringElement) -> Array2<u8> {
    sweep(input, element, Op::Erode)
}

/// Apply dilation.
///
/// A pixel turns on if any in-bounds pixel under the reflected element is on.
pub fn dilate(input: ArrayView2<u8>, element: &StructuringElement) -> Array2<u8> {
    sweep(input, element, Op::Dilate)
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

fn sweep(input: ArrayView2<u8>, element: &StructuringElement, op: Op) -> Array2<u8> {
    let (height, width) = input.dim();
    let mut output = Array2::<u8>::zeros((height, width));
    let sign = match op {
        Op::Erode => 1,
        Op::Dilate => -1,
    };

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            for x in 0..width {
                let mut covered = element.offsets.iter().filter_map(|&(dy, dx)| {
                    let sy = y as isize + sign * dy;
                    let sx = x as isize + sign * dx;
                    if sy < 0 || sy >= height as isize || sx < 0 || sx >= width as isize {
                        return None;
                    }
                    Some(input[[sy as usize, sx as usize]] != 0)
                });
                let on = match op {
                    Op::Erode => covered.all(|v| v),
                    Op::Dilate => covered.any(|v| v),
                };
                row[x] = u8::from(on);
            }
        });

    output
}

// ============================================================================
// Open / Close
// ============================================================================

/// Erosion followed by dilation; removes features smaller than the element.
pub fn open(input: ArrayView2<u8>, element: &StructuringElement) -> Array2<u8> {
    let eroded = erode(input, element);
    dilate(eroded.view(), element)
}

/// Dilation followed by erosion; fills gaps smaller than the element.
pub fn close(input: ArrayView2<u8>, element: &StructuringElement) -> Array2<u8> {
    let dilated = dilate(input, element);
    erode(dilated.view(), element)
}
