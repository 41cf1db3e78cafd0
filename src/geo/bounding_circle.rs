use super::*;
use get_size::GetSize;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Slack added to every overlap test, so rounding never turns a touching pair into a miss.
const BOUNDS_EPSILON: f64 = 1e-12;

/// A spherical cap that contains all of an extent's vertices.
///
/// Only ever used to reject candidates cheaply. A positive test says nothing about
/// whether the extents actually meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, GetSize)]
pub struct BoundingCircle {
    center: GeoPoint,
    /// Angular radius in radians.
    radius: f64,
}

impl BoundingCircle {
    pub fn new(center: GeoPoint, radius: f64) -> Self {
        BoundingCircle { center, radius }
    }

    pub fn around_point(point: GeoPoint) -> Self {
        BoundingCircle {
            center: point,
            radius: 0.0,
        }
    }

    /// Centred at the centroid of `points`, just wide enough to reach the furthest vertex.
    ///
    /// Caps wider than a hemisphere aren't convex, so an edge between two contained vertices
    /// could leave them. Such circles are widened to cover the whole sphere, as are the circles
    /// of vertices summing to zero, which have no centroid.
    pub fn from_points(points: &GeoArray) -> Self {
        let center = points.centroid();
        let radius = points.iter().map(|p| center.distance(p)).fold(0.0, |widest: f64, d| {
            if widest.is_nan() || d.is_nan() {
                f64::NAN
            } else {
                widest.max(d)
            }
        });
        // negated so NaN widens as well
        if !(radius < FRAC_PI_2) {
            return BoundingCircle::whole_sphere();
        }
        BoundingCircle { center, radius }
    }

    /// A cap around the north pole that covers everything.
    pub fn whole_sphere() -> Self {
        BoundingCircle {
            center: GeoPoint::NORTH_POLE,
            radius: PI,
        }
    }

    /// The circle around the shorter arc between `start` and `end`.
    pub fn for_arc(start: &GeoPoint, end: &GeoPoint) -> Self {
        if start == end {
            return Self::around_point(*start);
        }
        BoundingCircle {
            center: start.mid_point(end),
            radius: start.distance(end) / 2.0,
        }
    }

    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The same circle, grown by `range` radians.
    pub fn expanded(&self, range: f64) -> Self {
        BoundingCircle {
            center: self.center,
            radius: self.radius + range,
        }
    }

    /// `true` iff the circle around `other_center` with `other_radius` overlaps this one.
    pub fn intersects(&self, other_center: &GeoPoint, other_radius: f64) -> bool {
        self.center.distance(other_center) <= self.radius + other_radius + BOUNDS_EPSILON
    }

    pub fn intersects_circle(&self, other: &BoundingCircle) -> bool {
        self.intersects(&other.center, other.radius)
    }

    /// `true` if the circles come within `range` radians of each other.
    pub fn is_near(&self, other: &BoundingCircle, range: f64) -> bool {
        self.intersects(&other.center, other.radius + range)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.distance(point) <= self.radius + BOUNDS_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_points_contains_all_vertices() {
        let points = GeoArray::from_degrees(&[
            (54.5, -8.3),
            (55.0, -7.0),
            (53.2, -6.1),
            (52.0, -9.9),
            (54.1, -10.4),
        ]);
        let circle = BoundingCircle::from_points(&points);
        for p in points.iter() {
            assert!(circle.contains(p), "{p} not in {circle:?}");
        }
        assert!(!circle.contains(&GeoPoint::from_degrees(0.0, 0.0)));
    }

    #[test]
    fn test_vertices_without_centroid_cover_the_sphere() {
        let points: GeoArray = vec![
            GeoPoint::from_xyz(1.0, 0.0, 0.0),
            GeoPoint::from_xyz(0.0, 1.0, 0.0),
            GeoPoint::from_xyz(-1.0, 0.0, 0.0),
            GeoPoint::from_xyz(0.0, -1.0, 0.0),
        ]
        .into();
        let circle = BoundingCircle::from_points(&points);
        assert_eq!(PI, circle.radius());
        assert_eq!(&GeoPoint::NORTH_POLE, circle.center());
        for p in points.iter() {
            assert!(circle.contains(p));
        }
        assert!(circle.contains(&GeoPoint::SOUTH_POLE));
        let elsewhere = BoundingCircle::around_point(GeoPoint::from_degrees(0.0, 45.0));
        assert!(circle.intersects_circle(&elsewhere));
        assert!(elsewhere.is_near(&circle, 0.0));
    }

    #[test]
    fn test_intersects() {
        let a = BoundingCircle::new(GeoPoint::from_degrees(0.0, 0.0), 5f64.to_radians());
        let b = BoundingCircle::new(GeoPoint::from_degrees(0.0, 9.0), 5f64.to_radians());
        let c = BoundingCircle::new(GeoPoint::from_degrees(0.0, 11.0), 5f64.to_radians());
        assert!(a.intersects_circle(&b));
        assert!(b.intersects_circle(&a));
        assert!(!a.intersects_circle(&c));
        assert!(a.is_near(&c, 2f64.to_radians()));
        assert!(a.expanded(2f64.to_radians()).intersects_circle(&c));
        // touching circles
        let d = BoundingCircle::new(GeoPoint::from_degrees(0.0, 10.0), 5f64.to_radians());
        assert!(a.intersects_circle(&d));
    }

    #[test]
    fn test_for_arc() {
        let a = GeoPoint::from_degrees(0.0, 0.0);
        let b = GeoPoint::from_degrees(0.0, 20.0);
        let circle = BoundingCircle::for_arc(&a, &b);
        assert_abs_diff_eq!(circle.radius(), 10f64.to_radians(), epsilon = 1e-12);
        assert!(circle.contains(&a));
        assert!(circle.contains(&b));
        assert!(circle.contains(&GeoPoint::from_degrees(0.0, 7.0)));
        let point = BoundingCircle::for_arc(&a, &a);
        assert_eq!(0.0, point.radius());
    }
}
