//! Deciding which extents intersect, or come within a tolerance of, each other.
//!
//! An [Intersection] pairs a [MatchFilter](filter::MatchFilter), which sets the tolerance and
//! gates candidates cheaply, with a [MatchCollector](collector::MatchCollector), which records
//! whatever matched.
use crate::{
    geo::*,
    index::{CandidateSet, RTreeExtentIndex},
};
use collector::{MatchCollector, SetMatchCollector};
use filter::{MatchFilter, MatchParameters};

pub mod collector;
pub mod filter;
pub mod great_circle;

/// What a query is matched against.
#[derive(Clone, Copy, Debug)]
pub enum Candidates<'a> {
    One(ExtentRef<'a>),
    Many(CandidateSet<'a>),
}

impl<'a> From<ExtentRef<'a>> for Candidates<'a> {
    fn from(candidate: ExtentRef<'a>) -> Self {
        Candidates::One(candidate)
    }
}

impl<'a> From<&'a Extent> for Candidates<'a> {
    fn from(candidate: &'a Extent) -> Self {
        Candidates::One(candidate.into())
    }
}

impl<'a> From<&'a GeoLocation> for Candidates<'a> {
    fn from(candidate: &'a GeoLocation) -> Self {
        Candidates::One(candidate.into())
    }
}

impl<'a> From<GeoSegment> for Candidates<'a> {
    fn from(candidate: GeoSegment) -> Self {
        Candidates::One(candidate.into())
    }
}

impl<'a> From<&'a GeoPath> for Candidates<'a> {
    fn from(candidate: &'a GeoPath) -> Self {
        Candidates::One(candidate.into())
    }
}

impl<'a> From<&'a GeoRegion> for Candidates<'a> {
    fn from(candidate: &'a GeoRegion) -> Self {
        Candidates::One(candidate.into())
    }
}

impl<'a> From<CandidateSet<'a>> for Candidates<'a> {
    fn from(candidates: CandidateSet<'a>) -> Self {
        Candidates::Many(candidates)
    }
}

impl<'a> From<&'a [Extent]> for Candidates<'a> {
    fn from(candidates: &'a [Extent]) -> Self {
        Candidates::Many(candidates.into())
    }
}

impl<'a> From<&'a Vec<Extent>> for Candidates<'a> {
    fn from(candidates: &'a Vec<Extent>) -> Self {
        Candidates::Many(candidates.into())
    }
}

impl<'a> From<&'a RTreeExtentIndex> for Candidates<'a> {
    fn from(candidates: &'a RTreeExtentIndex) -> Self {
        Candidates::Many(candidates.into())
    }
}

/// A query engine with its filter and collector.
///
/// Not synchronised, run concurrent queries on separate instances.
#[derive(Debug, Clone, Default)]
pub struct Intersection<F, C> {
    filter: F,
    collector: C,
}

impl<'a> Intersection<MatchParameters, SetMatchCollector<'a>> {
    /// True intersections only, collecting the set of matched candidates.
    pub fn strict() -> Self {
        Self::with_parameters(MatchParameters::STRICT)
    }

    pub fn with_parameters(params: MatchParameters) -> Self {
        Intersection::new(params, SetMatchCollector::new())
    }
}

impl<F, C> Intersection<F, C>
where
    F: MatchFilter,
{
    pub fn new(filter: F, collector: C) -> Self {
        Intersection { filter, collector }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    pub fn into_collector(self) -> C {
        self.collector
    }

    /// Match `query` against one candidate or a whole collection, recording the results
    /// in the collector.
    ///
    /// Path queries are matched segment by segment, and the matching segment is recorded as
    /// the query side of a match. Against a single candidate only the first matching segment
    /// is recorded.
    pub fn consider<'a>(
        &mut self,
        query: impl Into<ExtentRef<'a>>,
        candidates: impl Into<Candidates<'a>>,
    ) where
        C: MatchCollector<'a>,
    {
        let query = query.into();
        match candidates.into() {
            Candidates::One(candidate) => self.consider_pair(query, candidate),
            Candidates::Many(candidates) => self.consider_all(query, candidates),
        }
    }

    fn consider_pair<'a>(&mut self, query: ExtentRef<'a>, candidate: ExtentRef<'a>)
    where
        C: MatchCollector<'a>,
    {
        if !self.filter.pre_consider(&query, &candidate) {
            log::trace!("Filtered out {} against {}", query.id(), candidate.id());
            return;
        }
        let h_range = self.filter.h_range();
        match query {
            ExtentRef::Path(path) => {
                let hit = path
                    .segments()
                    .find(|segment| matches(ExtentRef::Segment(*segment), candidate, h_range));
                if let Some(segment) = hit {
                    self.collector.collect(ExtentRef::Segment(segment), candidate);
                }
            }
            _ => {
                if matches(query, candidate, h_range) {
                    self.collector.collect(query, candidate);
                }
            }
        }
    }

    fn consider_all<'a>(&mut self, query: ExtentRef<'a>, candidates: CandidateSet<'a>)
    where
        C: MatchCollector<'a>,
    {
        let h_range = self.filter.h_range();
        let mut num_considered = 0usize;
        let mut num_matched = 0usize;
        match query {
            ExtentRef::Path(path) => {
                for segment in path.segments() {
                    let reach = segment.bounding_circle().expanded(h_range);
                    let segment = ExtentRef::Segment(segment);
                    for candidate in candidates.narrow(&reach) {
                        let candidate = ExtentRef::from(candidate);
                        if !self.filter.pre_consider(&query, &candidate) {
                            continue;
                        }
                        num_considered += 1;
                        if matches(segment, candidate, h_range) {
                            num_matched += 1;
                            self.collector.collect(segment, candidate);
                        }
                    }
                }
            }
            _ => {
                let reach = query.bounding_circle().expanded(h_range);
                for candidate in candidates.narrow(&reach) {
                    let candidate = ExtentRef::from(candidate);
                    if !self.filter.pre_consider(&query, &candidate) {
                        continue;
                    }
                    num_considered += 1;
                    if matches(query, candidate, h_range) {
                        num_matched += 1;
                        self.collector.collect(query, candidate);
                    }
                }
            }
        }
        log::debug!(
            "{} {}: {} of {} candidates passed the filter, {} matches",
            query.kind(),
            query.id(),
            num_considered,
            candidates.len(),
            num_matched
        );
    }
}

/// Whether two extents intersect, or come within `h_range` radians of each other.
///
/// Symmetric in its arguments.
pub fn matches(a: ExtentRef<'_>, b: ExtentRef<'_>, h_range: f64) -> bool {
    use ExtentRef::*;
    match (a, b) {
        (Location(location), other) | (other, Location(location)) => {
            location_matches(location.point(), other, h_range)
        }
        (Segment(segment), other) | (other, Segment(segment)) => {
            segment_matches(&segment, other, h_range)
        }
        (Path(path), other) | (other, Path(path)) => path_matches(path, other, h_range),
        (Region(a), Region(b)) => regions_match(a, b, h_range),
    }
}

fn location_matches(point: &GeoPoint, other: ExtentRef<'_>, h_range: f64) -> bool {
    match other {
        ExtentRef::Location(location) => {
            great_circle::is_point_near_point(*point, *location.point(), h_range)
        }
        ExtentRef::Segment(segment) => {
            great_circle::is_point_on_segment(*point, *segment.start(), *segment.end(), h_range)
        }
        ExtentRef::Path(path) => path.segments().any(|segment| {
            great_circle::is_point_on_segment(*point, *segment.start(), *segment.end(), h_range)
        }),
        ExtentRef::Region(region) => {
            region.contains(point) || region.is_point_near(point, h_range)
        }
    }
}

fn segment_matches(segment: &GeoSegment, other: ExtentRef<'_>, h_range: f64) -> bool {
    match other {
        ExtentRef::Location(location) => location_matches(location.point(), (*segment).into(), h_range),
        ExtentRef::Segment(other) => great_circle::segments_intersect_or_near(
            *segment.start(),
            *segment.end(),
            *other.start(),
            *other.end(),
            h_range,
        )
        .is_some(),
        ExtentRef::Path(path) => path.segments().any(|other| {
            great_circle::segments_intersect_or_near(
                *segment.start(),
                *segment.end(),
                *other.start(),
                *other.end(),
                h_range,
            )
            .is_some()
        }),
        // a segment that doesn't reach the boundary is either completely inside or outside
        ExtentRef::Region(region) => {
            region.is_segment_near(segment, h_range).is_some() || region.contains(segment.start())
        }
    }
}

fn path_matches(path: &GeoPath, other: ExtentRef<'_>, h_range: f64) -> bool {
    match other {
        ExtentRef::Location(location) => location_matches(location.point(), path.into(), h_range),
        ExtentRef::Segment(segment) => segment_matches(&segment, path.into(), h_range),
        ExtentRef::Path(other) => {
            great_circle::is_path_near_path(path.points(), other.points(), h_range).is_some()
        }
        ExtentRef::Region(region) => {
            great_circle::is_path_near_poly(path.points(), region.ring(), h_range).is_some()
                || path.points().first().is_some_and(|start| region.contains(start))
        }
    }
}

/// Containment first, then the boundaries.
fn regions_match(a: &GeoRegion, b: &GeoRegion, h_range: f64) -> bool {
    let contained = |inner: &GeoRegion, outer: &GeoRegion| {
        inner.ring().first().is_some_and(|vertex| outer.contains(vertex))
    };
    contained(a, b)
        || contained(b, a)
        || great_circle::is_poly_near_poly(a.ring(), b.ring(), h_range).is_some()
}
