//! Geometry for hit-testing. Scenes feed candidates through [`nearest_within`]
//! so every editor resolves overlaps the same way.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;

/// Pick the candidate with the smallest distance that is within `radius`.
///
/// Candidates are expected in draw order; on a tie the later (topmost)
/// candidate wins.
pub fn nearest_within<T, I>(candidates: I, radius: f64) -> Option<T>
where
    I: IntoIterator<Item = (T, f64)>,
{
    let mut best: Option<(T, f64)> = None;
    for (item, dist) in candidates {
        if !dist.is_finite() || dist > radius {
            continue;
        }
        let closer = best.as_ref().is_none_or(|(_, d)| dist <= *d);
        if closer {
            best = Some((item, dist));
        }
    }
    best.map(|(item, _)| item)
}

/// Shortest distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn dist_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.dist(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.dist(Point::new(a.x + t * dx, a.y + t * dy))
}
