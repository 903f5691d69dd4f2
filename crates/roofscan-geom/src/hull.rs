//! Convex hull used as the polygon-union approximation for plane merging.
//!
//! Exact polygon union is not needed to merge roof planes: the merged
//! boundary only describes shape, while areas are accounted separately.
//! The hull of all input vertices is deterministic and always simple.

use roofscan_math::{up, Dir3, Point2, Point3, Tolerance, Vec3};

use crate::frame::{canonical_up, PlaneFrame};
use crate::polygon::{centroid, newell_vector};

/// Indices of the 2D convex hull of `points`, counter-clockwise.
///
/// Andrew's monotone chain. Collinear and duplicate points are dropped;
/// non-finite points are ignored. Fewer than 3 distinct points yield the
/// distinct points themselves.
pub fn convex_hull_2d(points: &[Point2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].x.is_finite() && points[i].y.is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);

    if order.len() < 3 {
        return order;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() * 2);

    // Lower chain
    for &i in &order {
        while hull.len() >= 2 && cross(points, hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0 {
            hull.pop();
        }
        hull.push(i);
    }

    // Upper chain
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(points, hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }

    // The last point repeats the first
    hull.pop();
    hull
}

#[inline]
fn cross(points: &[Point2], o: usize, a: usize, b: usize) -> f64 {
    let (o, a, b) = (points[o], points[a], points[b]);
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Approximate the union of several boundary loops by the convex hull of
/// all their vertices.
///
/// Vertices are projected onto the area-weighted mean plane of the inputs
/// (each loop's Newell vector is flipped upward first so opposite windings
/// reinforce rather than cancel). The returned loop consists of original
/// input vertices, wound counter-clockwise around the upward mean normal.
pub fn union_approximate(loops: &[Vec<Point3>]) -> Vec<Point3> {
    let all: Vec<Point3> = loops.iter().flatten().copied().collect();
    union_approximate_indices(loops)
        .into_iter()
        .map(|i| all[i])
        .collect()
}

/// Like [`union_approximate`], but returns indices into the concatenation
/// of all loops, so callers can recover per-vertex attributes.
///
/// Non-finite vertices never appear in the result. When the hull collapses
/// to fewer than 3 points, the finite vertices of the loop with the largest
/// Newell magnitude are returned instead.
pub fn union_approximate_indices(loops: &[Vec<Point3>]) -> Vec<usize> {
    let all: Vec<Point3> = loops.iter().flatten().copied().collect();
    let finite: Vec<Point3> = all.iter().copied().filter(is_finite_point).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let normals: Vec<Vec3> = loops.iter().map(|l| newell_vector(l)).collect();
    let summed = normals
        .iter()
        .filter(|n| !Tolerance::DEFAULT.is_degenerate(n))
        .fold(Vec3::zeros(), |acc, n| {
            let dir = Dir3::new_normalize(*n);
            if canonical_up(&dir).dot(dir.as_ref()) < 0.0 {
                acc - n
            } else {
                acc + n
            }
        });
    let normal = if Tolerance::DEFAULT.is_degenerate(&summed) {
        up()
    } else {
        canonical_up(&Dir3::new_normalize(summed))
    };

    let frame = PlaneFrame::from_normal(centroid(&finite), &normal);
    let projected: Vec<Point2> = all.iter().map(|p| frame.project(p)).collect();
    let hull = convex_hull_2d(&projected);
    if hull.len() >= 3 {
        return hull;
    }

    // Degenerate hull: keep the dominant loop as-is
    let mut offset = 0;
    let mut best: Option<(f64, usize, usize)> = None;
    for (l, n) in loops.iter().zip(&normals) {
        let mag = n.norm();
        if mag.is_finite() && best.map_or(true, |(m, _, _)| mag > m) {
            best = Some((mag, offset, l.len()));
        }
        offset += l.len();
    }
    match best {
        Some((_, start, len)) => (start..start + len)
            .filter(|&i| is_finite_point(&all[i]))
            .collect(),
        None => hull,
    }
}

fn is_finite_point(p: &Point3) -> bool {
    p.iter().all(|c| c.is_finite())
}
