//! Numeric predicates on great-circle arcs.
//!
//! Every arc passed to these functions must be shorter than a hemisphere, otherwise it's ambiguous
//! which of the two arcs between its endpoints is meant. [GeoPath](crate::GeoPath) and
//! [GeoRegion](crate::GeoRegion) check this on construction.
use crate::geo::{GeoArray, GeoPoint};
use itertools::Itertools;
use std::f64::consts::{FRAC_PI_2, PI};

/// Rounding slack for "is this point on the arc".
const ON_ARC_EPSILON: f64 = 1e-12;
/// Cross products shorter than this mean the two vectors are (anti)parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

const X_AXIS: GeoPoint = GeoPoint::from_xyz(1.0, 0.0, 0.0);
const Y_AXIS: GeoPoint = GeoPoint::from_xyz(0.0, 1.0, 0.0);
const Z_AXIS: GeoPoint = GeoPoint::from_xyz(0.0, 0.0, 1.0);

/// Unit normal of the great circle through `start` and `end`,
/// or `None` if the arc is too short to define one.
fn arc_normal(start: &GeoPoint, end: &GeoPoint) -> Option<GeoPoint> {
    let normal = start.cross(end);
    (normal.length() > PARALLEL_EPSILON).then(|| normal.normalize())
}

/// Whether `point`, assumed on the arc's great circle, lies on the arc extended by `tolerance`
/// at both ends.
fn is_on_arc(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint, tolerance: f64) -> bool {
    let span = start.distance(end);
    point.distance(start) + point.distance(end) <= span + 2.0 * tolerance + ON_ARC_EPSILON
}

fn debug_check_span(start: &GeoPoint, end: &GeoPoint) {
    debug_assert!(
        start.distance(end) < PI,
        "arc from {start} to {end} is not shorter than a hemisphere"
    );
}

/// Where the arc `a1 → a2` crosses or comes within `tolerance` radians of the arc `b1 → b2`.
///
/// Of the two points where the great circles meet, the one on arc A (extended by `tolerance` at
/// both ends) is tested against arc B. Arcs whose circles meet nowhere near both of them don't
/// match, however close they run alongside each other.
///
/// Arcs on the same great circle match if an endpoint of one lies within `tolerance` of the
/// other. Zero-length arcs are treated as points.
pub fn segments_intersect_or_near(
    a1: GeoPoint,
    a2: GeoPoint,
    b1: GeoPoint,
    b2: GeoPoint,
    tolerance: f64,
) -> Option<GeoPoint> {
    debug_check_span(&a1, &a2);
    debug_check_span(&b1, &b2);

    match (arc_normal(&a1, &a2), arc_normal(&b1, &b2)) {
        (Some(normal_a), Some(normal_b)) => match arc_normal(&normal_a, &normal_b) {
            Some(crossing) => [crossing, crossing.antipode()].into_iter().find(|candidate| {
                is_on_arc(candidate, &a1, &a2, tolerance) && is_on_arc(candidate, &b1, &b2, tolerance)
            }),
            // both arcs lie on the same great circle
            None => nearest_endpoint(a1, a2, b1, b2, tolerance),
        },
        _ => nearest_endpoint(a1, a2, b1, b2, tolerance),
    }
}

/// The first endpoint of either arc that lies within `tolerance` of the other one.
fn nearest_endpoint(
    a1: GeoPoint,
    a2: GeoPoint,
    b1: GeoPoint,
    b2: GeoPoint,
    tolerance: f64,
) -> Option<GeoPoint> {
    let reach = tolerance + ON_ARC_EPSILON;
    [a1, a2]
        .into_iter()
        .find(|p| point_arc_distance(*p, b1, b2) <= reach)
        .or_else(|| {
            [b1, b2]
                .into_iter()
                .find(|p| point_arc_distance(*p, a1, a2) <= reach)
        })
}

/// Exact intersection test between two arcs.
pub fn segments_intersect(a1: GeoPoint, a2: GeoPoint, b1: GeoPoint, b2: GeoPoint) -> bool {
    segments_intersect_or_near(a1, a2, b1, b2, 0.0).is_some()
}

/// Angular distance of `point` from the great circle with unit normal `normal`.
pub fn point_circle_distance(point: GeoPoint, normal: GeoPoint) -> f64 {
    point.dot(&normal).clamp(-1.0, 1.0).asin().abs()
}

/// Angular distance of `point` from the arc `start → end`, bounded to the arc itself.
pub fn point_arc_distance(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    debug_check_span(&start, &end);
    let endpoint_distance = || point.distance(&start).min(point.distance(&end));
    let Some(normal) = arc_normal(&start, &end) else {
        return endpoint_distance();
    };
    let projected = point - normal * point.dot(&normal);
    if projected.length() < PARALLEL_EPSILON {
        // pole of the circle, every point of the arc is a quarter turn away
        return FRAC_PI_2;
    }
    if is_on_arc(&projected.normalize(), &start, &end, 0.0) {
        point_circle_distance(point, normal)
    } else {
        endpoint_distance()
    }
}

pub fn is_point_near_point(a: GeoPoint, b: GeoPoint, tolerance: f64) -> bool {
    a.distance(&b) <= tolerance + ON_ARC_EPSILON
}

/// Whether `point` lies within `tolerance` of the arc `start → end`.
pub fn is_point_on_segment(point: GeoPoint, start: GeoPoint, end: GeoPoint, tolerance: f64) -> bool {
    point_arc_distance(point, start, end) <= tolerance + ON_ARC_EPSILON
}

/// Axis of a great circle through `point` that passes clear of every vertex of `ring`.
///
/// The circle through the centroid comes first, then the circles through points along the edges.
/// A vertex on the circle would hide the crossing of both its edges.
fn reference_axis(centroid: &GeoPoint, point: &GeoPoint, ring: &GeoArray) -> GeoPoint {
    let clears_vertices =
        |axis: &GeoPoint| ring.iter().all(|vertex| vertex.dot(axis).abs() > PARALLEL_EPSILON);
    let mut fallback = None;
    // rings with an odd number of vertices can have one opposite every edge midpoint
    let through = std::iter::once(*centroid)
        .chain(ring.ring_edges().map(|(p1, p2)| p1.mid_point(&p2)))
        .chain(ring.ring_edges().map(|(p1, p2)| p1.interpolate(&p2, 1.0 / 3.0)));
    for axis in through.filter_map(|target| arc_normal(&target, point)) {
        if clears_vertices(&axis) {
            return axis;
        }
        fallback.get_or_insert(axis);
    }
    if let Some(axis) = fallback {
        // every candidate touches a vertex, e.g. because `point` is one
        return axis;
    }
    let (x, y, z) = (point.x().abs(), point.y().abs(), point.z().abs());
    let basis = if x <= y && x <= z {
        X_AXIS
    } else if y <= z {
        Y_AXIS
    } else {
        Z_AXIS
    };
    point.cross_normalize(&basis)
}

/// Crossing number test for `point` against the ring `ring`.
///
/// Only meaningful for rings that fit within a hemisphere around their centroid. Points a quarter
/// turn or more from the centroid are always outside. Closer points are reported inside if either
/// they or their antipode are enclosed, callers must rule out the latter with a bounding circle.
///
/// Edges touching the reference circle with a vertex don't count as crossings, so the circle is
/// chosen to miss the vertices where possible.
pub fn is_point_in_polygon(point: GeoPoint, ring: &GeoArray) -> bool {
    let centroid = ring.centroid();
    // negated so a NaN centroid rejects as well
    if !(point.distance(&centroid) < FRAC_PI_2) {
        return false;
    }
    let ray = reference_axis(&centroid, &point, ring);
    let side = point.cross_normalize(&ray);

    let mut inside = false;
    for (p1, p2) in ring.ring_edges() {
        let d1 = p1.dot(&ray);
        let d2 = p2.dot(&ray);
        let crosses = (d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0);
        if crosses {
            let crossing = p1 * d2.abs() + p2 * d1.abs();
            if crossing.dot(&side) > 0.0 {
                inside = !inside;
            }
        }
    }
    inside
}

/// First place where the arc `s1 → s2` comes within `tolerance` of an edge of `ring`.
pub fn is_segment_near_poly(
    s1: GeoPoint,
    s2: GeoPoint,
    ring: &GeoArray,
    tolerance: f64,
) -> Option<GeoPoint> {
    ring.ring_edges()
        .find_map(|(p1, p2)| segments_intersect_or_near(s1, s2, p1, p2, tolerance))
}

/// Every place where the arc `s1 → s2` comes within `tolerance` of an edge of `ring`.
pub fn segment_near_poly(s1: GeoPoint, s2: GeoPoint, ring: &GeoArray, tolerance: f64) -> Vec<GeoPoint> {
    ring.ring_edges()
        .filter_map(|(p1, p2)| segments_intersect_or_near(s1, s2, p1, p2, tolerance))
        .collect()
}

/// Whether `point` lies within `tolerance` of any edge of `ring`.
pub fn is_point_near_poly(point: GeoPoint, ring: &GeoArray, tolerance: f64) -> bool {
    ring.ring_edges()
        .any(|(p1, p2)| is_point_on_segment(point, p1, p2, tolerance))
}

/// First place where the boundaries of two rings come within `tolerance` of each other.
pub fn is_poly_near_poly(ring_a: &GeoArray, ring_b: &GeoArray, tolerance: f64) -> Option<GeoPoint> {
    ring_a
        .ring_edges()
        .find_map(|(a1, a2)| is_segment_near_poly(a1, a2, ring_b, tolerance))
}

/// Every place where the boundaries of two rings come within `tolerance` of each other.
pub fn poly_near_poly(ring_a: &GeoArray, ring_b: &GeoArray, tolerance: f64) -> Vec<GeoPoint> {
    ring_a
        .ring_edges()
        .flat_map(|(a1, a2)| segment_near_poly(a1, a2, ring_b, tolerance))
        .collect()
}

/// First place where the open polyline `path` comes within `tolerance` of the boundary of `ring`.
pub fn is_path_near_poly(path: &GeoArray, ring: &GeoArray, tolerance: f64) -> Option<GeoPoint> {
    path.path_edges()
        .find_map(|(s1, s2)| is_segment_near_poly(s1, s2, ring, tolerance))
}

/// First place where two open polylines come within `tolerance` of each other.
pub fn is_path_near_path(path_a: &GeoArray, path_b: &GeoArray, tolerance: f64) -> Option<GeoPoint> {
    path_a.path_edges().find_map(|(a1, a2)| {
        path_b
            .path_edges()
            .find_map(|(b1, b2)| segments_intersect_or_near(a1, a2, b1, b2, tolerance))
    })
}

/// Whether any two non-adjacent edges of `ring` intersect.
pub fn is_self_intersecting_poly(ring: &GeoArray) -> bool {
    let edges: Vec<(GeoPoint, GeoPoint)> = ring.ring_edges().collect();
    let last = edges.len().saturating_sub(1);
    edges
        .iter()
        .enumerate()
        .tuple_combinations()
        .filter(|((i, _), (j, _))| *j != i + 1 && !(*i == 0 && *j == last))
        .any(|((_, a), (_, b))| segments_intersect(a.0, a.1, b.0, b.1))
}
