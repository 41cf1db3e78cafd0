//! Intersection and proximity queries between geographic extents on a sphere.
//!
//! Locations, polylines and polygons are represented as unit vectors connected by great-circle
//! arcs. The [intersection](intersection) module answers "does this touch that?" for single pairs
//! and drives bulk queries over candidate collections, optionally narrowed by an
//! [index](index::ExtentIndex).
use snafu::{prelude::*, Backtrace};

pub mod batch;
pub mod geo;
pub mod geometry;
pub mod index;
pub mod intersection;

pub use geo::{
    BoundingCircle,
    Extent,
    ExtentId,
    ExtentRef,
    GeoArray,
    GeoExtent,
    GeoLocation,
    GeoPath,
    GeoPoint,
    GeoRegion,
    GeoSegment,
};
pub use index::{CandidateSet, ExtentIndex, RTreeExtentIndex};
pub use intersection::{
    collector::{CollectionMatchCollector, MatchCollector, PairArrayMatchCollector, SetMatchCollector},
    filter::{ExactFilter, MatchFilter, MatchParameters, PredicateFilter},
    Candidates,
    Intersection,
};

pub type Result<T, E = GeoError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GeoError {
    #[snafu(display("Latitude must be within [-90º, 90º], not {value}º"))]
    LatitudeOutOfRange { value: f64, backtrace: Backtrace },
    #[snafu(display("Coordinates must be finite, got ({lat}, {lon})"))]
    NonFiniteCoordinate {
        lat: f64,
        lon: f64,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not parse a position from '{input}': {description}"))]
    PositionFormat {
        input: String,
        description: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not parse the number '{input}': {source}"))]
    NumberFormat {
        input: String,
        source: std::num::ParseFloatError,
        backtrace: Backtrace,
    },
    #[snafu(display("Coordinates must come in (lat, lon) pairs, but got {count} values"))]
    OddCoordinateCount { count: usize, backtrace: Backtrace },
    #[snafu(display("A {kind} needs at least {required} vertices, but got {actual}"))]
    TooFewVertices {
        kind: &'static str,
        required: usize,
        actual: usize,
        backtrace: Backtrace,
    },
    #[snafu(display(
        "Edge {index} of the {kind} spans {span_deg}º, but edges must be shorter than a hemisphere"
    ))]
    EdgeTooLong {
        kind: &'static str,
        index: usize,
        span_deg: f64,
        backtrace: Backtrace,
    },
    #[snafu(display("A match tolerance must be finite and non-negative, not {value} rad"))]
    InvalidTolerance { value: f64, backtrace: Backtrace },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lon: f64, half_side: f64) -> Extent {
        let ring = GeoArray::from_degrees(&[
            (lat - half_side, lon - half_side),
            (lat - half_side, lon + half_side),
            (lat + half_side, lon + half_side),
            (lat + half_side, lon - half_side),
        ]);
        GeoRegion::new(ring).expect("valid square").into()
    }

    fn five_candidates() -> (Vec<Extent>, Vec<ExtentId>) {
        // query covers [-10, 10] x [-10, 10]
        let overlapping = square(8.0, 8.0, 5.0);
        let contained = square(0.0, 0.0, 2.0);
        let far_east = square(0.0, 60.0, 5.0);
        let far_north = square(50.0, 0.0, 5.0);
        let antipodal = square(0.0, 180.0, 5.0);
        let expected = vec![overlapping.id(), contained.id()];
        (
            vec![far_east, overlapping, far_north, contained, antipodal],
            expected,
        )
    }

    #[test]
    fn test_region_against_regions_scan() {
        let query = square(0.0, 0.0, 10.0);
        let (candidates, expected) = five_candidates();
        let mut intersection = Intersection::strict();
        intersection.consider(&query, candidates.as_slice());
        let mut found: Vec<ExtentId> = intersection.collector().ids().collect();
        found.sort();
        assert_eq!(expected, found);
    }

    #[test]
    fn test_region_against_regions_is_order_independent() {
        let query = square(0.0, 0.0, 10.0);
        let (mut candidates, expected) = five_candidates();
        candidates.reverse();
        let mut intersection = Intersection::strict();
        intersection.consider(&query, candidates.as_slice());
        let mut found: Vec<ExtentId> = intersection.collector().ids().collect();
        found.sort();
        assert_eq!(expected, found);
    }

    #[test]
    fn test_region_against_indexed_regions() {
        let query = square(0.0, 0.0, 10.0);
        let (candidates, expected) = five_candidates();
        let index: RTreeExtentIndex = candidates.into_iter().collect();
        let mut intersection = Intersection::strict();
        intersection.consider(&query, &index);
        let mut found: Vec<ExtentId> = intersection.collector().ids().collect();
        found.sort();
        assert_eq!(expected, found);
    }

    #[test]
    fn test_empty_candidates_yield_empty_collector() {
        let query = square(0.0, 0.0, 10.0);
        let candidates: Vec<Extent> = Vec::new();
        let mut intersection = Intersection::strict();
        intersection.consider(&query, candidates.as_slice());
        assert!(intersection.collector().is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = GeoRegion::new(GeoArray::from_degrees(&[(0.0, 0.0), (1.0, 1.0)]))
            .expect_err("too few vertices");
        assert_eq!(
            "A region needs at least 3 vertices, but got 2",
            err.to_string()
        );
    }
}
