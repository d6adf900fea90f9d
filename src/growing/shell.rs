//! Shell enumeration for cube-shaped growth fronts.
//!
//! The shell at radius `r` is the surface of the axis-aligned cube of
//! half-width `r` around a center, i.e. exactly the voxels at Chebyshev
//! distance `r`. It is produced as three disjoint face slabs:
//!
//! | Slab | x | y | z |
//! |------|---|---|---|
//! | yz faces | `{sx-r, sx+r}` | `[sy-r, sy+r]` | `[sz-r, sz+r]` |
//! | xz faces | `(sx-r, sx+r)` | `{sy-r, sy+r}` | `[sz-r, sz+r]` |
//! | xy faces | `(sx-r, sx+r)` | `(sy-r, sy+r)` | `{sz-r, sz+r}` |
//!
//! Open intervals on the later slabs keep edges and corners from being
//! listed twice. Within a slab x varies slowest and z fastest.

use crate::volume::Voxel;

/// Lazily enumerate the shell of radius `radius` around `center`.
///
/// Radius 0 yields the center alone.
pub fn shell(center: Voxel, radius: usize) -> impl Iterator<Item = Voxel> {
    let r = radius as isize;
    let Voxel { x: sx, y: sy, z: sz } = center;

    let yz = slab(faces(sx, r), closed(sy, r), closed(sz, r));
    let xz = slab(open(sx, r), faces(sy, r), closed(sz, r));
    let xy = slab(open(sx, r), open(sy, r), faces(sz, r));

    yz.chain(xz).chain(xy)
}

/// Number of voxels in the shell of radius `radius`.
pub fn shell_len(radius: usize) -> usize {
    if radius == 0 {
        return 1;
    }
    let outer = 2 * radius + 1;
    let inner = 2 * radius - 1;
    outer.pow(3) - inner.pow(3)
}

fn faces(c: isize, r: isize) -> Vec<isize> {
    if r == 0 {
        vec![c]
    } else {
        vec![c - r, c + r]
    }
}

fn closed(c: isize, r: isize) -> Vec<isize> {
    (c - r..=c + r).collect()
}

fn open(c: isize, r: isize) -> Vec<isize> {
    (c - r + 1..c + r).collect()
}

fn slab(xs: Vec<isize>, ys: Vec<isize>, zs: Vec<isize>) -> impl Iterator<Item = Voxel> {
    xs.into_iter().flat_map(move |x| {
        let zs = zs.clone();
        ys.clone()
            .into_iter()
            .flat_map(move |y| zs.clone().into_iter().map(move |z| Voxel::new(x, y, z)))
    })
}
