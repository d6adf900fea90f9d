//! Convex hull and solid polygon fill on integer pixel grids.

use ndarray::Array2;

/// Pixel position in a slice, `(row, col)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    pub row: i64,
    pub col: i64,
}

impl Pixel {
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

/// Z component of `(a - o) x (b - o)`; positive for a left turn.
#[inline]
fn cross(o: Pixel, a: Pixel, b: Pixel) -> i64 {
    (a.row - o.row) * (b.col - o.col) - (a.col - o.col) * (b.row - o.row)
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns the hull vertices in turn order without collinear points. Fewer
/// than three distinct input points come back unchanged (sorted, deduped),
/// and fully collinear input yields the two end points.
pub fn convex_hull(points: &[Pixel]) -> Vec<Pixel> {
    let mut pts = points.to_vec();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Pixel> = Vec::with_capacity(2 * pts.len());

    // Lower chain
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Upper chain
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Last point repeats the first
    hull.pop();
    hull
}

/// Rasterize the convex polygon `hull` into a `shape` image.
///
/// Pixels inside the polygon or on its boundary become 1. The polygon must
/// be in the turn order produced by [`convex_hull`]; parts outside the image
/// are dropped.
pub fn fill_convex(hull: &[Pixel], shape: (usize, usize)) -> Array2<u8> {
    let mut image = Array2::<u8>::zeros(shape);
    let (height, width) = shape;
    if hull.is_empty() || height == 0 || width == 0 {
        return image;
    }

    let row_min = hull.iter().map(|p| p.row).min().unwrap_or(0).max(0);
    let row_max = hull.iter().map(|p| p.row).max().unwrap_or(0).min(height as i64 - 1);
    let col_min = hull.iter().map(|p| p.col).min().unwrap_or(0).max(0);
    let col_max = hull.iter().map(|p| p.col).max().unwrap_or(0).min(width as i64 - 1);

    for row in row_min..=row_max {
        for col in col_min..=col_max {
            let p = Pixel::new(row, col);
            let inside = (0..hull.len()).all(|i| {
                let a = hull[i];
                let b = hull[(i + 1) % hull.len()];
                cross(a, b, p) >= 0
            });
            if inside {
                image[[row as usize, col as usize]] = 1;
            }
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(row: i64, col: i64) -> Pixel {
        Pixel::new(row, col)
    }

    #[test]
    fn test_hull_of_square_with_interior() {
        let mut points = Vec::new();
        for r in 0..4 {
            for c in 0..4 {
                points.push(px(r, c));
            }
        }
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        for corner in [px(0, 0), px(0, 3), px(3, 0), px(3, 3)] {
            assert!(hull.contains(&corner));
        }
    }

    #[test]
    fn test_hull_drops_collinear_and_duplicates() {
        let points = [px(0, 0), px(0, 1), px(0, 2), px(2, 0), px(0, 0), px(1, 1)];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 3);
        assert!(!hull.contains(&px(0, 1)));
        assert!(!hull.contains(&px(1, 1)));
    }

    #[test]
    fn test_hull_of_line() {
        let points = [px(2, 1), px(2, 5), px(2, 3)];
        let hull = convex_hull(&points);
        assert_eq!(hull, vec![px(2, 1), px(2, 5)]);

        // A line hull still rasterizes to its pixels
        let image = fill_convex(&hull, (4, 8));
        assert_eq!(image.sum(), 5);
        assert_eq!(image[[2, 1]], 1);
        assert_eq!(image[[2, 5]], 1);
    }

    #[test]
    fn test_fill_triangle_includes_boundary() {
        let hull = convex_hull(&[px(0, 0), px(0, 4), px(4, 0)]);
        let image = fill_convex(&hull, (6, 6));

        // Right triangle with legs of 5 pixels: 5 + 4 + 3 + 2 + 1
        assert_eq!(image.sum(), 15);
        assert_eq!(image[[0, 4]], 1);
        assert_eq!(image[[2, 2]], 1);
        assert_eq!(image[[3, 2]], 0);
    }

    #[test]
    fn test_fill_clips_to_image() {
        let hull = convex_hull(&[px(-2, -2), px(-2, 10), px(10, -2), px(10, 10)]);
        let image = fill_convex(&hull, (3, 4));
        assert_eq!(image.sum(), 12);
    }
}
