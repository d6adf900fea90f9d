//! Round brush for painting seed masks.
//!
//! Footprints are clipped to the grid, so a stroke near the border paints
//! only its in-bounds part.

use crate::error::{SegmentError, SegmentResult};
use crate::volume::{LabelMask, Voxel};

/// Default brush radius in voxels.
pub const DEFAULT_BRUSH_RADIUS: usize = 5;

/// Paint a ball of `radius` around `center`.
///
/// # Returns
/// Number of voxels that were empty before the stroke.
pub fn paint_sphere(mask: &mut LabelMask, center: Voxel, radius: usize) -> usize {
    let r = radius as isize;
    let r_sq = r * r;
    let mut painted = 0;

    for dx in -r..=r {
        for dy in -r..=r {
            for dz in -r..=r {
                if dx * dx + dy * dy + dz * dz > r_sq {
                    continue;
                }
                let voxel = Voxel::new(center.x + dx, center.y + dy, center.z + dz);
                // Out-of-bounds voxels are clipped
                if let Ok(false) = mask.get(voxel) {
                    if mask.set(voxel, true).is_ok() {
                        painted += 1;
                    }
                }
            }
        }
    }

    painted
}

/// Paint a disc of `radius` into slice `index` along `axis`.
///
/// `center` is `(u, v)` in the slice's own coordinates: the remaining two
/// axes in increasing order.
///
/// # Returns
/// Number of voxels that were empty before the stroke.
pub fn paint_disc(
    mask: &mut LabelMask,
    axis: usize,
    index: usize,
    center: (isize, isize),
    radius: usize,
) -> SegmentResult<usize> {
    let (dx, dy, dz) = mask.dimensions();
    let extent = match axis {
        0 => dx,
        1 => dy,
        2 => dz,
        _ => {
            return Err(SegmentError::InvalidInput(format!(
                "brush axis must be 0, 1 or 2, got {axis}"
            )))
        }
    };
    if index >= extent {
        let mut voxel = [0isize; 3];
        voxel[axis] = index as isize;
        return Err(SegmentError::OutOfBounds {
            voxel: Voxel::new(voxel[0], voxel[1], voxel[2]),
            dims: mask.dimensions(),
        });
    }

    let r = radius as isize;
    let r_sq = r * r;
    let fixed = index as isize;
    let mut painted = 0;

    for du in -r..=r {
        for dv in -r..=r {
            if du * du + dv * dv > r_sq {
                continue;
            }
            let (u, v) = (center.0 + du, center.1 + dv);
            let voxel = match axis {
                0 => Voxel::new(fixed, u, v),
                1 => Voxel::new(u, fixed, v),
                _ => Voxel::new(u, v, fixed),
            };
            if let Ok(false) = mask.get(voxel) {
                mask.set(voxel, true)?;
                painted += 1;
            }
        }
    }

    Ok(painted)
}
