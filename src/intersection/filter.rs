use crate::{
    geo::{length_to_radians, ExtentRef, GeoExtent},
    GeoError,
    InvalidToleranceSnafu,
    Result,
};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use uom::si::{angle::radian, f64::*};

/// Decides the tolerance of a query and which pairs are worth the exact tests.
pub trait MatchFilter {
    /// Angular tolerance in radians. Zero means only true intersections match.
    fn h_range(&self) -> f64;

    /// Cheap gate evaluated before any exact geometry.
    ///
    /// Must not reject pairs that could match within [h_range](MatchFilter::h_range).
    fn pre_consider(&self, query: &ExtentRef<'_>, candidate: &ExtentRef<'_>) -> bool {
        query
            .bounding_circle()
            .is_near(&candidate.bounding_circle(), self.h_range())
    }
}

impl<F: MatchFilter + ?Sized> MatchFilter for &F {
    fn h_range(&self) -> f64 {
        (**self).h_range()
    }

    fn pre_consider(&self, query: &ExtentRef<'_>, candidate: &ExtentRef<'_>) -> bool {
        (**self).pre_consider(query, candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// True topological intersection.
    Strict,
    /// Near-misses within the tolerance count as well.
    Buffered,
}

/// Tolerance of a query, gated by bounding circles.
///
/// Serialises as the bare tolerance in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MatchParameters {
    h_range: f64,
}

impl MatchParameters {
    pub const STRICT: MatchParameters = MatchParameters { h_range: 0.0 };

    /// `h_range` is in radians and must be finite and non-negative.
    pub fn new(h_range: f64) -> Result<Self> {
        ensure!(
            h_range.is_finite() && h_range >= 0.0,
            InvalidToleranceSnafu { value: h_range }
        );
        Ok(MatchParameters { h_range })
    }

    /// A tolerance given as a distance along the earth's surface.
    pub fn from_distance(distance: Length) -> Result<Self> {
        Self::new(length_to_radians(distance))
    }

    pub fn from_angle(angle: Angle) -> Result<Self> {
        Self::new(angle.get::<radian>())
    }

    pub fn mode(&self) -> MatchMode {
        if self.is_strict() {
            MatchMode::Strict
        } else {
            MatchMode::Buffered
        }
    }

    pub fn is_strict(&self) -> bool {
        self.h_range == 0.0
    }
}

impl Default for MatchParameters {
    fn default() -> Self {
        Self::STRICT
    }
}

impl MatchFilter for MatchParameters {
    fn h_range(&self) -> f64 {
        self.h_range
    }
}

impl TryFrom<f64> for MatchParameters {
    type Error = GeoError;

    fn try_from(h_range: f64) -> Result<Self> {
        Self::new(h_range)
    }
}

impl From<MatchParameters> for f64 {
    fn from(params: MatchParameters) -> f64 {
        params.h_range
    }
}

impl fmt::Display for MatchParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode() {
            MatchMode::Strict => write!(f, "strict"),
            MatchMode::Buffered => write!(f, "within {}º", self.h_range.to_degrees()),
        }
    }
}

/// Strict matching without the bounding circle gate, every pair goes through the exact tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExactFilter;

impl MatchFilter for ExactFilter {
    fn h_range(&self) -> f64 {
        0.0
    }

    fn pre_consider(&self, _query: &ExtentRef<'_>, _candidate: &ExtentRef<'_>) -> bool {
        true
    }
}

/// Adds a caller supplied eligibility check on top of [MatchParameters].
///
/// The predicate runs after the bounding circle gate.
pub struct PredicateFilter<P> {
    params: MatchParameters,
    predicate: P,
}

impl<P> PredicateFilter<P>
where
    P: Fn(&ExtentRef<'_>, &ExtentRef<'_>) -> bool,
{
    pub fn new(params: MatchParameters, predicate: P) -> Self {
        PredicateFilter { params, predicate }
    }

    pub fn params(&self) -> &MatchParameters {
        &self.params
    }
}

impl<P> fmt::Debug for PredicateFilter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFilter")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<P> MatchFilter for PredicateFilter<P>
where
    P: Fn(&ExtentRef<'_>, &ExtentRef<'_>) -> bool,
{
    fn h_range(&self) -> f64 {
        self.params.h_range()
    }

    fn pre_consider(&self, query: &ExtentRef<'_>, candidate: &ExtentRef<'_>) -> bool {
        self.params.pre_consider(query, candidate) && (self.predicate)(query, candidate)
    }
}
