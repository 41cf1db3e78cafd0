use super::*;
use crate::{OddCoordinateCountSnafu, Result};
use approx::AbsDiffEq;
use get_size::GetSize;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::ops::Index;

/// Two vertices closer than this are considered the same when deciding whether a ring
/// is explicitly closed.
const CLOSURE_EPSILON: f64 = 1e-12;

/// An ordered sequence of [GeoPoint]s forming a path or a ring.
///
/// The order of the vertices is significant, it defines the direction of the path
/// or the winding of the ring.
///
/// A ring may or may not repeat its first vertex at the end.
/// [ring_edges](GeoArray::ring_edges) synthesises the closing edge if it does not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, GetSize)]
pub struct GeoArray {
    points: Vec<GeoPoint>,
}

impl GeoArray {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        GeoArray { points }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        GeoArray {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Build from `(lat, lon)` pairs in degrees.
    pub fn from_degrees(coords: &[(f64, f64)]) -> Self {
        coords
            .iter()
            .map(|&(lat, lon)| GeoPoint::from_degrees(lat, lon))
            .collect()
    }

    /// Build from a flat `[lat0, lon0, lat1, lon1, ...]` list in degrees.
    pub fn from_lat_lon_degrees(coords: &[f64]) -> Result<Self> {
        Self::from_flat(coords, GeoPoint::from_degrees)
    }

    /// Build from a flat `[lat0, lon0, lat1, lon1, ...]` list in radians.
    pub fn from_lat_lon_radians(coords: &[f64]) -> Result<Self> {
        Self::from_flat(coords, GeoPoint::from_radians)
    }

    fn from_flat(coords: &[f64], to_point: fn(f64, f64) -> GeoPoint) -> Result<Self> {
        ensure!(
            coords.len() % 2 == 0,
            OddCoordinateCountSnafu {
                count: coords.len()
            }
        );
        Ok(coords
            .iter()
            .tuples()
            .map(|(&lat, &lon)| to_point(lat, lon))
            .collect())
    }

    /// Flat `[lat0, lon0, lat1, lon1, ...]` list in degrees.
    pub fn to_lat_lon_degrees(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.lat_degrees(), p.lon_degrees()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GeoPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoPoint> {
        self.points.iter()
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.points.push(point);
    }

    pub fn reversed(&self) -> GeoArray {
        self.points.iter().rev().copied().collect()
    }

    /// `true` if the last vertex repeats the first one.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 => {
                first.abs_diff_eq(last, CLOSURE_EPSILON)
            }
            _ => false,
        }
    }

    /// The vertices without the explicit closing vertex, if there is one.
    pub fn distinct_vertices(&self) -> &[GeoPoint] {
        if self.is_closed() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Edges of an open path, `(v[i], v[i + 1])`.
    pub fn path_edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        self.points.iter().copied().tuple_windows()
    }

    /// Edges of a ring, including the edge from the last vertex back to the first one
    /// when the array isn't explicitly closed.
    pub fn ring_edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        let closing = match (self.points.first(), self.points.last()) {
            (Some(&first), Some(&last)) if self.points.len() > 1 && !self.is_closed() => {
                Some((last, first))
            }
            _ => None,
        };
        self.path_edges().chain(closing)
    }

    /// Normalized vector sum of the distinct vertices.
    ///
    /// Undefined (NaN) for empty arrays and for vertex sets that cancel out,
    /// like two antipodal points.
    pub fn centroid(&self) -> GeoPoint {
        self.distinct_vertices()
            .iter()
            .fold(GeoPoint::from_xyz(0.0, 0.0, 0.0), |sum, p| sum + *p)
            .normalize()
    }

    /// Area enclosed by the ring in steradians (multiply by r² for a surface area).
    ///
    /// Computed as the sum of the signed spherical excesses of the triangles
    /// between the centroid and every edge, so the winding direction does not matter.
    pub fn ring_area(&self) -> f64 {
        let c = self.centroid();
        let excess: f64 = self
            .ring_edges()
            .map(|(p1, p2)| {
                let numerator = c.dot(&p1.cross(&p2));
                let denominator = 1.0 + c.dot(&p1) + p1.dot(&p2) + p2.dot(&c);
                2.0 * numerator.atan2(denominator)
            })
            .sum();
        excess.abs()
    }
}

impl Index<usize> for GeoArray {
    type Output = GeoPoint;

    fn index(&self, index: usize) -> &GeoPoint {
        &self.points[index]
    }
}

impl FromIterator<GeoPoint> for GeoArray {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        GeoArray {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<GeoPoint>> for GeoArray {
    fn from(points: Vec<GeoPoint>) -> Self {
        GeoArray { points }
    }
}

impl<'a> IntoIterator for &'a GeoArray {
    type Item = &'a GeoPoint;
    type IntoIter = std::slice::Iter<'a, GeoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
