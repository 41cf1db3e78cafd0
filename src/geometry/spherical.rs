use super::*;
use crate::geo::BoundingCircle;
use planar::*;
use std::f64::consts::PI;

/// Slack in radians added around every circle, so rounding never produces a box
/// smaller than the circle it bounds.
const ERROR: f64 = 1e-9;

/// A lon/lat box around a [BoundingCircle].
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BoundingBox {
    Simple(Rectangle),
    /// Crosses the antimeridian, so `low_corner.x > high_corner.x`.
    AntimeridianWrap(Rectangle),
    /// Everything north of a latitude in degrees.
    ArcticCap(f64),
    /// Everything south of a latitude in degrees.
    AntarcticCap(f64),
    /// Circles wrapping both poles. No filtering possible.
    Globe,
}

impl BoundingBox {
    pub fn from_circle(circle: &BoundingCircle) -> BoundingBox {
        let radius = circle.radius() + ERROR;
        if radius >= PI {
            return BoundingBox::Globe;
        }
        let centre = circle.center();
        let lat = centre.lat_radians();
        let north = (lat + radius).to_degrees();
        let south = (lat - radius).to_degrees();
        match (north >= 90.0, south <= -90.0) {
            (true, true) => return BoundingBox::Globe,
            // wrapped over the northpole
            (true, false) => return BoundingBox::ArcticCap(south),
            // wrapped over the southpole
            (false, true) => return BoundingBox::AntarcticCap(north),
            (false, false) => (),
        }

        let ratio = radius.sin() / lat.cos();
        if ratio >= 1.0 {
            return BoundingBox::Simple(Rectangle::new(-180.0, south, 180.0, north));
        }
        let half_width = ratio.asin().to_degrees();
        let lon = centre.lon_degrees();
        let west = lon - half_width;
        let east = lon + half_width;
        if west < -180.0 {
            BoundingBox::AntimeridianWrap(wrapped(west + 360.0, south, east, north))
        } else if east > 180.0 {
            BoundingBox::AntimeridianWrap(wrapped(west, south, east - 360.0, north))
        } else {
            BoundingBox::Simple(Rectangle::new(west, south, east, north))
        }
    }

    /// Plain rectangles covering exactly this box.
    pub fn to_rectangles(&self) -> Vec<Rectangle> {
        match self {
            BoundingBox::Simple(r) => vec![*r],
            BoundingBox::AntimeridianWrap(r) => vec![
                Rectangle::new(r.low_corner.x, r.low_corner.y, 180.0, r.high_corner.y),
                Rectangle::new(-180.0, r.low_corner.y, r.high_corner.x, r.high_corner.y),
            ],
            BoundingBox::ArcticCap(lat) => vec![Rectangle::new(-180.0, *lat, 180.0, 90.0)],
            BoundingBox::AntarcticCap(lat) => vec![Rectangle::new(-180.0, -90.0, 180.0, *lat)],
            BoundingBox::Globe => vec![Rectangle::WORLD],
        }
    }
}

/// A rectangle running east from `west` across the antimeridian to `east`.
fn wrapped(west: f64, south: f64, east: f64, north: f64) -> Rectangle {
    Rectangle {
        low_corner: Point { x: west, y: south },
        high_corner: Point { x: east, y: north },
    }
}

impl Intersecting<Rectangle> for BoundingBox {
    type IntersectionShape = Vec<Rectangle>;

    fn intersects(&self, other: &Rectangle) -> bool {
        match self {
            BoundingBox::Simple(r) => r.intersects(other),
            BoundingBox::AntimeridianWrap(r) => {
                let y_overlap =
                    r.low_corner.y <= other.high_corner.y && other.low_corner.y <= r.high_corner.y;
                // other can't wrap, so one sided tests are sufficient
                let x_overlap =
                    r.low_corner.x <= other.high_corner.x || other.low_corner.x <= r.high_corner.x;

                x_overlap && y_overlap
            }
            BoundingBox::ArcticCap(lat) => other.high_corner.y >= *lat,
            BoundingBox::AntarcticCap(lat) => other.low_corner.y <= *lat,
            BoundingBox::Globe => true,
        }
    }

    fn intersection(&self, other: &Rectangle) -> Option<Self::IntersectionShape> {
        let parts: Vec<Rectangle> = self
            .to_rectangles()
            .iter()
            .filter_map(|r| r.intersection(other))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }

    fn contains(&self, other: &Rectangle) -> bool {
        match self {
            BoundingBox::Simple(r) => r.contains(other),
            BoundingBox::AntimeridianWrap(r) => {
                let y_contain =
                    r.low_corner.y <= other.low_corner.y && other.high_corner.y <= r.high_corner.y;
                // other can't wrap, so one sided tests are sufficient
                let x_contain =
                    r.low_corner.x <= other.low_corner.x || other.high_corner.x <= r.high_corner.x;

                x_contain && y_contain
            }
            BoundingBox::ArcticCap(lat) => other.low_corner.y >= *lat,
            BoundingBox::AntarcticCap(lat) => other.high_corner.y <= *lat,
            BoundingBox::Globe => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use approx::assert_abs_diff_eq;

    fn circle(lat: f64, lon: f64, radius_deg: f64) -> BoundingCircle {
        BoundingCircle::new(GeoPoint::from_degrees(lat, lon), radius_deg.to_radians())
    }

    #[test]
    fn test_rectangle_bounding_box_intersection() {
        let r1 = Rectangle::new(-1.0, -1.0, 1.0, 1.0);
        let b1 = BoundingBox::Simple(r1);
        assert!(b1.intersects(&r1));
        let r2 = Rectangle::new(2.0, 2.0, 3.0, 3.0);
        assert!(!b1.intersects(&r2));
        let r3 = Rectangle::new(2.0, 2.0, 170.0, 80.0);
        let b2 = BoundingBox::AntimeridianWrap(Rectangle {
            low_corner: Point { x: 160.0, y: 20.0 },
            high_corner: Point { x: -160.0, y: 60.0 },
        });
        assert!(b2.intersects(&r3));
        assert!(!b2.intersects(&r1));
        let b3 = BoundingBox::ArcticCap(70.0);
        assert!(b3.intersects(&r3));
        assert!(!b3.intersects(&r1));
        let r4 = Rectangle::new(20.0, -80.0, 60.0, 10.0);
        let b4 = BoundingBox::AntarcticCap(-70.0);
        assert!(b4.intersects(&r4));
        assert!(!b4.intersects(&r1));
        assert!(BoundingBox::Globe.intersects(&r1));
    }

    #[test]
    fn test_containment_and_intersection_shapes() {
        let wrap = BoundingBox::AntimeridianWrap(Rectangle {
            low_corner: Point { x: 160.0, y: 20.0 },
            high_corner: Point { x: -160.0, y: 60.0 },
        });
        assert!(wrap.contains(&Rectangle::new(165.0, 30.0, 175.0, 40.0)));
        assert!(wrap.contains(&Rectangle::new(-175.0, 30.0, -165.0, 40.0)));
        assert!(!wrap.contains(&Rectangle::new(150.0, 30.0, 170.0, 40.0)));
        let parts = wrap
            .intersection(&Rectangle::new(-180.0, 0.0, 180.0, 90.0))
            .expect("overlaps");
        assert_eq!(2, parts.len());
        assert_eq!(None, wrap.intersection(&Rectangle::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(2, wrap.to_rectangles().len());
    }

    #[test]
    fn test_box_from_circle() {
        let simple = BoundingBox::from_circle(&circle(54.5, -8.3, 1.0));
        let BoundingBox::Simple(r) = simple else {
            panic!("expected a simple box, got {simple:?}");
        };
        assert_abs_diff_eq!(r.low_corner.y, 53.5, epsilon = 1e-6);
        assert_abs_diff_eq!(r.high_corner.y, 55.5, epsilon = 1e-6);
        // wider in longitude than in latitude this far north
        assert!(r.high_corner.x - r.low_corner.x > 2.0);
        assert!(simple.intersects(&Rectangle::new(-10.0, 50.0, -5.0, 60.0)));
        assert!(!simple.intersects(&Rectangle::new(0.0, 50.0, 5.0, 60.0)));

        assert!(matches!(
            BoundingBox::from_circle(&circle(0.0, 178.0, 5.0)),
            BoundingBox::AntimeridianWrap(_)
        ));
        assert!(matches!(
            BoundingBox::from_circle(&circle(0.0, -178.0, 5.0)),
            BoundingBox::AntimeridianWrap(_)
        ));
        assert!(matches!(
            BoundingBox::from_circle(&circle(85.0, 0.0, 10.0)),
            BoundingBox::ArcticCap(lat) if (lat - 75.0).abs() < 1e-6
        ));
        assert!(matches!(
            BoundingBox::from_circle(&circle(-85.0, 0.0, 10.0)),
            BoundingBox::AntarcticCap(_)
        ));
        assert_eq!(BoundingBox::Globe, BoundingBox::from_circle(&circle(0.0, 0.0, 180.0)));
        assert_eq!(BoundingBox::Globe, BoundingBox::from_circle(&circle(0.0, 0.0, 95.0)));
    }

    #[test]
    fn test_box_covers_circle() {
        for (lat, lon, radius) in [(60.0, 10.0, 8.0), (-30.0, 179.0, 4.0), (0.0, -179.5, 1.0)] {
            let c = circle(lat, lon, radius);
            let boxes = BoundingBox::from_circle(&c).to_rectangles();
            for step in 0..36 {
                let azimuth = (step as f64 * 10.0).to_radians();
                let edge = c.center().offset(c.radius(), azimuth);
                let p = Point {
                    x: edge.lon_degrees(),
                    y: edge.lat_degrees(),
                };
                assert!(
                    boxes.iter().any(|r| r.intersects(&p)),
                    "{p} of {c:?} not in {boxes:?}"
                );
            }
        }
    }
}
