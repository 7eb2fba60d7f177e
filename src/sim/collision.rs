//! Collision detection between pools
//!
//! Brute-force O(n·m) passes with circle or box predicates. A pass only
//! *detects*: it reports `(a_index, b_index)` pairs and leaves every pool
//! untouched, so all hits of one pass see the same positions.

use glam::Vec2;

use super::pool::Pool;

/// Circle-circle overlap. Touching circles (distance exactly `ra + rb`) do
/// not collide.
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Axis-aligned box given by center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Square box enclosing a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center, Vec2::splat(radius))
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }
}

/// Strict box overlap on both axes; boxes sharing only an edge do not collide
#[inline]
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    let d = (a.center - b.center).abs();
    let reach = a.half_extents + b.half_extents;
    d.x < reach.x && d.y < reach.y
}

/// Test every active A against every active B.
///
/// The first B that `test` accepts for a given A is reported through
/// `on_hit(a_index, b_index)` and the inner loop stops for that A, so an A
/// hits at most one B per pass. The outer loop keeps going, so a single B
/// may be reported for several A's.
///
/// Returns the number of hits reported.
pub fn check_all<A, B, T, H>(a: &Pool<A>, b: &Pool<B>, mut test: T, mut on_hit: H) -> usize
where
    T: FnMut(&A, &B) -> bool,
    H: FnMut(usize, usize),
{
    let mut hits = 0;
    for (ia, ea) in a.iter_active() {
        for (ib, eb) in b.iter_active() {
            if test(ea, eb) {
                on_hit(ia, ib);
                hits += 1;
                break;
            }
        }
    }
    hits
}

/// `check_all` collecting the hit pairs in outer-loop order
pub fn collect_hits<A, B, T>(a: &Pool<A>, b: &Pool<B>, test: T) -> Vec<(usize, usize)>
where
    T: FnMut(&A, &B) -> bool,
{
    let mut pairs = Vec::new();
    check_all(a, b, test, |ia, ib| pairs.push((ia, ib)));
    pairs
}
