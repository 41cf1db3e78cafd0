use super::*;
use crate::{
    geometry::HasArea,
    intersection::great_circle,
    EdgeTooLongSnafu,
    Result,
    TooFewVerticesSnafu,
};
use get_size::GetSize;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::{
    f64::consts::PI,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Edges must be strictly shorter than this, or the great-circle tests can't tell
/// which of the two possible arcs is meant.
const MAX_EDGE_SPAN: f64 = PI - 1e-9;

/// Opaque identity of an extent.
///
/// Freshly constructed extents get a process-wide unique id.
/// Use `with_id` to carry an id from the producer of the geometry instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, GetSize,
)]
pub struct ExtentId(pub u64);

impl ExtentId {
    pub fn fresh() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ExtentId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExtentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can take part in an intersection query.
pub trait GeoExtent {
    fn id(&self) -> ExtentId;

    /// A cap containing the whole geometry, for cheap rejection.
    fn bounding_circle(&self) -> BoundingCircle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtentKind {
    Location,
    Segment,
    Path,
    Region,
}

impl fmt::Display for ExtentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtentKind::Location => "location",
            ExtentKind::Segment => "segment",
            ExtentKind::Path => "path",
            ExtentKind::Region => "region",
        };
        f.write_str(name)
    }
}

/// A single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, GetSize)]
pub struct GeoLocation {
    id: ExtentId,
    point: GeoPoint,
}

impl GeoLocation {
    pub fn new(point: GeoPoint) -> Self {
        GeoLocation {
            id: ExtentId::fresh(),
            point,
        }
    }

    pub fn with_id(mut self, id: ExtentId) -> Self {
        self.id = id;
        self
    }

    pub fn point(&self) -> &GeoPoint {
        &self.point
    }
}

impl GeoExtent for GeoLocation {
    fn id(&self) -> ExtentId {
        self.id
    }

    fn bounding_circle(&self) -> BoundingCircle {
        BoundingCircle::around_point(self.point)
    }
}

/// Two consecutive vertices of a path or a ring.
///
/// Segments are values produced while iterating over their parent and share its id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSegment {
    start: GeoPoint,
    end: GeoPoint,
    parent: ExtentId,
    index: usize,
}

impl GeoSegment {
    /// A free-standing segment with its own id.
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        GeoSegment {
            start,
            end,
            parent: ExtentId::fresh(),
            index: 0,
        }
    }

    pub fn start(&self) -> &GeoPoint {
        &self.start
    }

    pub fn end(&self) -> &GeoPoint {
        &self.end
    }

    /// Id of the path or region this segment was taken from.
    pub fn parent(&self) -> ExtentId {
        self.parent
    }

    /// Position of this segment within its parent.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Angular length in radians.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Pole of the great circle this segment lies on.
    pub fn great_circle(&self) -> GeoPoint {
        self.start.cross_normalize(&self.end)
    }
}

impl GeoExtent for GeoSegment {
    fn id(&self) -> ExtentId {
        self.parent
    }

    fn bounding_circle(&self) -> BoundingCircle {
        BoundingCircle::for_arc(&self.start, &self.end)
    }
}

/// Forward iterator over the segments of a path or region.
///
/// Finite, and restartable by asking the parent for a new one.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    points: &'a [GeoPoint],
    /// Whether to synthesise the segment from the last vertex back to the first.
    closing: bool,
    next: usize,
    parent: ExtentId,
}

impl<'a> Segments<'a> {
    fn new(points: &'a [GeoPoint], closing: bool, parent: ExtentId) -> Self {
        Segments {
            points,
            closing,
            next: 0,
            parent,
        }
    }

    fn total(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closing => n,
            n => n - 1,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = GeoSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let index = self.next;
        let start = self.points[index];
        let end = self.points[(index + 1) % self.points.len()];
        self.next += 1;
        Some(GeoSegment {
            start,
            end,
            parent: self.parent,
            index,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Segments<'_> {}

fn validate_edges(
    kind: &'static str,
    edges: impl Iterator<Item = (GeoPoint, GeoPoint)>,
) -> Result<()> {
    for (index, (start, end)) in edges.enumerate() {
        let span = start.distance(&end);
        ensure!(
            span < MAX_EDGE_SPAN,
            EdgeTooLongSnafu {
                kind,
                index,
                span_deg: span.to_degrees(),
            }
        );
    }
    Ok(())
}

/// An open polyline.
#[derive(Debug, Clone, PartialEq, GetSize)]
pub struct GeoPath {
    id: ExtentId,
    points: GeoArray,
    bounds: BoundingCircle,
}

impl GeoPath {
    /// Fails if there are fewer than two vertices,
    /// or if any segment isn't shorter than a hemisphere.
    pub fn new(points: GeoArray) -> Result<Self> {
        ensure!(
            points.len() >= 2,
            TooFewVerticesSnafu {
                kind: "path",
                required: 2usize,
                actual: points.len(),
            }
        );
        validate_edges("path", points.path_edges())?;
        let bounds = BoundingCircle::from_points(&points);
        Ok(GeoPath {
            id: ExtentId::fresh(),
            points,
            bounds,
        })
    }

    pub fn with_id(mut self, id: ExtentId) -> Self {
        self.id = id;
        self
    }

    pub fn points(&self) -> &GeoArray {
        &self.points
    }

    pub fn segments(&self) -> Segments<'_> {
        Segments::new(self.points.points(), false, self.id)
    }

    /// Total angular length in radians.
    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }
}

impl GeoExtent for GeoPath {
    fn id(&self) -> ExtentId {
        self.id
    }

    fn bounding_circle(&self) -> BoundingCircle {
        self.bounds
    }
}

/// A polygon, described by its outer ring.
#[derive(Debug, Clone, PartialEq, GetSize)]
pub struct GeoRegion {
    id: ExtentId,
    ring: GeoArray,
    bounds: BoundingCircle,
}

impl GeoRegion {
    /// Fails if there are fewer than three distinct vertices,
    /// or if any edge (including the closing one) isn't shorter than a hemisphere.
    pub fn new(ring: GeoArray) -> Result<Self> {
        let distinct = ring.distinct_vertices().len();
        ensure!(
            distinct >= 3,
            TooFewVerticesSnafu {
                kind: "region",
                required: 3usize,
                actual: distinct,
            }
        );
        validate_edges("region", ring.ring_edges())?;
        let bounds = BoundingCircle::from_points(&ring);
        Ok(GeoRegion {
            id: ExtentId::fresh(),
            ring,
            bounds,
        })
    }

    pub fn with_id(mut self, id: ExtentId) -> Self {
        self.id = id;
        self
    }

    pub fn ring(&self) -> &GeoArray {
        &self.ring
    }

    /// Segments of the ring, including the closing one.
    pub fn segments(&self) -> Segments<'_> {
        let closing = !self.ring.is_closed();
        Segments::new(self.ring.points(), closing, self.id)
    }

    /// Whether `point` lies inside the ring.
    ///
    /// The bounding circle check in front of the polygon test rejects points whose
    /// antipode is inside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bounds.contains(point) && great_circle::is_point_in_polygon(*point, &self.ring)
    }

    /// Where `segment` comes within `tolerance` of the boundary, if it does.
    pub fn is_segment_near(&self, segment: &GeoSegment, tolerance: f64) -> Option<GeoPoint> {
        great_circle::is_segment_near_poly(segment.start, segment.end, &self.ring, tolerance)
    }

    /// Whether `point` lies within `tolerance` of the boundary.
    pub fn is_point_near(&self, point: &GeoPoint, tolerance: f64) -> bool {
        great_circle::is_point_near_poly(*point, &self.ring, tolerance)
    }

    pub fn is_self_intersecting(&self) -> bool {
        great_circle::is_self_intersecting_poly(&self.ring)
    }
}

impl GeoExtent for GeoRegion {
    fn id(&self) -> ExtentId {
        self.id
    }

    fn bounding_circle(&self) -> BoundingCircle {
        self.bounds
    }
}

impl HasArea for GeoRegion {
    /// Steradians.
    fn area(&self) -> f64 {
        self.ring.ring_area()
    }
}

/// An owned extent of any kind, e.g. an entry of a candidate collection.
#[derive(Debug, Clone, PartialEq, GetSize)]
pub enum Extent {
    Location(GeoLocation),
    Path(GeoPath),
    Region(GeoRegion),
}

impl Extent {
    pub fn kind(&self) -> ExtentKind {
        match self {
            Extent::Location(_) => ExtentKind::Location,
            Extent::Path(_) => ExtentKind::Path,
            Extent::Region(_) => ExtentKind::Region,
        }
    }

    pub fn view(&self) -> ExtentRef<'_> {
        ExtentRef::from(self)
    }
}

impl GeoExtent for Extent {
    fn id(&self) -> ExtentId {
        match self {
            Extent::Location(l) => l.id(),
            Extent::Path(p) => p.id(),
            Extent::Region(r) => r.id(),
        }
    }

    fn bounding_circle(&self) -> BoundingCircle {
        match self {
            Extent::Location(l) => l.bounding_circle(),
            Extent::Path(p) => p.bounding_circle(),
            Extent::Region(r) => r.bounding_circle(),
        }
    }
}

impl From<GeoLocation> for Extent {
    fn from(location: GeoLocation) -> Self {
        Extent::Location(location)
    }
}

impl From<GeoPath> for Extent {
    fn from(path: GeoPath) -> Self {
        Extent::Path(path)
    }
}

impl From<GeoRegion> for Extent {
    fn from(region: GeoRegion) -> Self {
        Extent::Region(region)
    }
}

/// A borrowed extent of any kind, as passed into and collected from queries.
///
/// Segments are held by value, since they only exist while their parent is iterated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtentRef<'a> {
    Location(&'a GeoLocation),
    Segment(GeoSegment),
    Path(&'a GeoPath),
    Region(&'a GeoRegion),
}

impl<'a> ExtentRef<'a> {
    pub fn kind(&self) -> ExtentKind {
        match self {
            ExtentRef::Location(_) => ExtentKind::Location,
            ExtentRef::Segment(_) => ExtentKind::Segment,
            ExtentRef::Path(_) => ExtentKind::Path,
            ExtentRef::Region(_) => ExtentKind::Region,
        }
    }
}

impl GeoExtent for ExtentRef<'_> {
    fn id(&self) -> ExtentId {
        match self {
            ExtentRef::Location(l) => l.id(),
            ExtentRef::Segment(s) => s.id(),
            ExtentRef::Path(p) => p.id(),
            ExtentRef::Region(r) => r.id(),
        }
    }

    fn bounding_circle(&self) -> BoundingCircle {
        match self {
            ExtentRef::Location(l) => l.bounding_circle(),
            ExtentRef::Segment(s) => s.bounding_circle(),
            ExtentRef::Path(p) => p.bounding_circle(),
            ExtentRef::Region(r) => r.bounding_circle(),
        }
    }
}

impl<'a> From<&'a Extent> for ExtentRef<'a> {
    fn from(extent: &'a Extent) -> Self {
        match extent {
            Extent::Location(l) => ExtentRef::Location(l),
            Extent::Path(p) => ExtentRef::Path(p),
            Extent::Region(r) => ExtentRef::Region(r),
        }
    }
}

impl<'a> From<&'a GeoLocation> for ExtentRef<'a> {
    fn from(location: &'a GeoLocation) -> Self {
        ExtentRef::Location(location)
    }
}

impl From<GeoSegment> for ExtentRef<'_> {
    fn from(segment: GeoSegment) -> Self {
        ExtentRef::Segment(segment)
    }
}

impl<'a> From<&'a GeoPath> for ExtentRef<'a> {
    fn from(path: &'a GeoPath) -> Self {
        ExtentRef::Path(path)
    }
}

impl<'a> From<&'a GeoRegion> for ExtentRef<'a> {
    fn from(region: &'a GeoRegion) -> Self {
        ExtentRef::Region(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoError;
    use approx::assert_abs_diff_eq;

    fn square() -> GeoArray {
        GeoArray::from_degrees(&[(-10.0, -10.0), (-10.0, 10.0), (10.0, 10.0), (10.0, -10.0)])
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = GeoLocation::new(GeoPoint::from_degrees(0.0, 0.0));
        let b = GeoLocation::new(GeoPoint::from_degrees(0.0, 0.0));
        assert_ne!(a.id(), b.id());
        let c = b.with_id(ExtentId(42));
        assert_eq!(ExtentId(42), c.id());
        assert_eq!("#42", c.id().to_string());
    }

    #[test]
    fn test_path_validation() {
        let too_short = GeoPath::new(GeoArray::from_degrees(&[(0.0, 0.0)]));
        assert!(matches!(
            too_short,
            Err(GeoError::TooFewVertices {
                required: 2,
                actual: 1,
                ..
            })
        ));
        let antipodal = GeoPath::new(GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 180.0)]));
        assert!(matches!(
            antipodal,
            Err(GeoError::EdgeTooLong { index: 0, .. })
        ));
        let fine = GeoPath::new(GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 179.0)]));
        assert!(fine.is_ok());
    }

    #[test]
    fn test_region_validation() {
        // three vertices, but one of them just closes the ring
        let mut degenerate = GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 10.0)]);
        degenerate.push(degenerate[0]);
        assert!(matches!(
            GeoRegion::new(degenerate),
            Err(GeoError::TooFewVertices { actual: 2, .. })
        ));
        // the synthetic closing edge is checked as well
        let wide = GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 90.0), (0.0, 180.0)]);
        assert!(matches!(
            GeoRegion::new(wide),
            Err(GeoError::EdgeTooLong { index: 2, .. })
        ));
        assert!(GeoRegion::new(square()).is_ok());
    }

    #[test]
    fn test_path_segments() {
        let path = GeoPath::new(GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 10.0), (5.0, 15.0)]))
            .expect("path");
        let segments: Vec<GeoSegment> = path.segments().collect();
        assert_eq!(2, segments.len());
        assert_eq!(2, path.segments().len());
        assert_eq!(path.points()[1], *segments[0].end());
        assert_eq!(path.points()[1], *segments[1].start());
        assert_eq!(1, segments[1].index());
        assert_eq!(path.id(), segments[1].parent());
        // restartable
        assert_eq!(segments, path.segments().collect::<Vec<_>>());
        assert_abs_diff_eq!(
            path.length(),
            segments[0].length() + segments[1].length(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_region_segments_close_the_ring() {
        let open = GeoRegion::new(square()).expect("region");
        let segments: Vec<GeoSegment> = open.segments().collect();
        assert_eq!(4, segments.len());
        assert_eq!(open.ring()[3], *segments[3].start());
        assert_eq!(open.ring()[0], *segments[3].end());

        let mut ring = square();
        ring.push(ring[0]);
        let closed = GeoRegion::new(ring).expect("region");
        assert_eq!(4, closed.segments().count());
    }

    #[test]
    fn test_region_contains() {
        let region = GeoRegion::new(square()).expect("region");
        assert!(region.contains(&GeoPoint::from_degrees(0.0, 0.0)));
        assert!(region.contains(&GeoPoint::from_degrees(5.0, -5.0)));
        assert!(!region.contains(&GeoPoint::from_degrees(50.0, 50.0)));
        assert!(!region.contains(&GeoPoint::from_degrees(0.0, 180.0)));
        assert!(!region.contains(&GeoPoint::from_degrees(0.0, 12.0)));

        let diamond = GeoRegion::new(GeoArray::from_degrees(&[
            (10.0, 0.0),
            (0.0, 10.0),
            (-10.0, 0.0),
            (0.0, -10.0),
        ]))
        .expect("region");
        assert!(diamond.contains(&diamond.ring().centroid()));
        assert!(diamond.contains(&GeoPoint::from_degrees(0.0, 0.0)));
    }

    #[test]
    fn test_region_proximity() {
        let region = GeoRegion::new(square()).expect("region");
        let outside = GeoPoint::from_degrees(0.0, 11.0);
        assert!(!region.is_point_near(&outside, 0.5f64.to_radians()));
        assert!(region.is_point_near(&outside, 1.5f64.to_radians()));

        let crossing = GeoSegment::new(
            GeoPoint::from_degrees(0.0, 0.0),
            GeoPoint::from_degrees(0.0, 20.0),
        );
        let hit = region.is_segment_near(&crossing, 0.0).expect("crosses the east edge");
        assert_abs_diff_eq!(hit.lon_degrees(), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hit.lat_degrees(), 0.0, epsilon = 1e-9);
        assert!(!region.is_self_intersecting());
    }

    #[test]
    fn test_extent_views() {
        let region: Extent = GeoRegion::new(square()).expect("region").into();
        let view = region.view();
        assert_eq!(ExtentKind::Region, view.kind());
        assert_eq!(region.id(), view.id());
        assert_eq!(region.bounding_circle(), view.bounding_circle());
        let location: Extent = GeoLocation::new(GeoPoint::from_degrees(1.0, 2.0)).into();
        assert_eq!(ExtentKind::Location, location.kind());
        assert_eq!(0.0, location.bounding_circle().radius());
        let segment = GeoSegment::new(
            GeoPoint::from_degrees(0.0, 0.0),
            GeoPoint::from_degrees(0.0, 1.0),
        );
        let segment_view: ExtentRef<'_> = segment.into();
        assert_eq!(ExtentKind::Segment, segment_view.kind());
        assert_eq!(segment.parent(), segment_view.id());
    }

    #[test]
    fn test_region_area() {
        let octant = GeoRegion::new(GeoArray::from_degrees(&[(0.0, 0.0), (0.0, 90.0), (90.0, 0.0)]))
            .expect("region");
        assert_abs_diff_eq!(octant.area(), std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }
}
