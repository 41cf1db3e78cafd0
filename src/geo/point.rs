use super::*;
use crate::{
    LatitudeOutOfRangeSnafu,
    NonFiniteCoordinateSnafu,
    NumberFormatSnafu,
    PositionFormatSnafu,
    Result,
};
use approx::AbsDiffEq;
use get_size::GetSize;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::{
    f64::consts::{FRAC_PI_2, PI},
    fmt,
    ops::{Add, Mul, Neg, Sub},
    str::FromStr,
};
use uom::si::{angle::radian, f64::*};

/// A location on the unit sphere, stored as a 3-D unit vector.
///
/// The x axis points at (0º, 0º), the y axis at (0º, 90ºE) and the z axis at the north pole.
///
/// All operations are pure and `GeoPoint` is `Copy`, so intermediate results live on the stack.
/// Feeding a zero-length vector into any operation is a caller bug and yields NaN components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, GetSize)]
pub struct GeoPoint {
    x: f64,
    y: f64,
    z: f64,
}

impl GeoPoint {
    pub const NORTH_POLE: GeoPoint = GeoPoint {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };
    pub const SOUTH_POLE: GeoPoint = GeoPoint {
        x: 0.0,
        y: 0.0,
        z: -1.0,
    };

    /// Raw vector components. The result is only a valid location if they have unit length.
    pub const fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        GeoPoint { x, y, z }
    }

    pub fn from_radians(lat: f64, lon: f64) -> Self {
        let cos_lat = lat.cos();
        GeoPoint {
            x: cos_lat * lon.cos(),
            y: cos_lat * lon.sin(),
            z: lat.sin(),
        }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self::from_radians(lat.to_radians(), lon.to_radians())
    }

    pub fn from_angles(lat: Angle, lon: Angle) -> Self {
        Self::from_radians(lat.get::<radian>(), lon.get::<radian>())
    }

    /// Same as [from_degrees](GeoPoint::from_degrees), but rejects non-finite values and
    /// latitudes outside of [-90º, 90º]. Longitudes wrap.
    pub fn try_from_degrees(lat: f64, lon: f64) -> Result<Self> {
        ensure!(
            lat.is_finite() && lon.is_finite(),
            NonFiniteCoordinateSnafu { lat, lon }
        );
        ensure!(
            (-90.0..=90.0).contains(&lat),
            LatitudeOutOfRangeSnafu { value: lat }
        );
        Ok(Self::from_degrees(lat, lon))
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn lat_radians(&self) -> f64 {
        self.z.atan2(self.x.hypot(self.y))
    }

    pub fn lon_radians(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn lat_degrees(&self) -> f64 {
        self.lat_radians().to_degrees()
    }

    pub fn lon_degrees(&self) -> f64 {
        self.lon_radians().to_degrees()
    }

    pub fn latitude(&self) -> Angle {
        Angle::new::<radian>(self.lat_radians())
    }

    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(self.lon_radians())
    }

    pub fn dot(&self, other: &GeoPoint) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Unit normal of the plane through the origin, `self` and `other`,
    /// i.e. the pole of the great circle through both points.
    pub fn cross_normalize(&self, other: &GeoPoint) -> GeoPoint {
        self.cross(other).normalize()
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> GeoPoint {
        *self * self.length().recip()
    }

    /// The point diametrically opposite of this one.
    pub fn antipode(&self) -> GeoPoint {
        -*self
    }

    /// Angular distance in radians, within [0, π].
    ///
    /// Uses `atan2(|a×b|, a·b)` rather than `acos(a·b)`, which loses precision for
    /// nearly identical or nearly antipodal points.
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        self.cross(other).length().atan2(self.dot(other))
    }

    pub fn distance_angle(&self, other: &GeoPoint) -> Angle {
        Angle::new::<radian>(self.distance(other))
    }

    /// Distance along the surface of a spherical earth.
    pub fn surface_distance(&self, other: &GeoPoint) -> Length {
        radians_to_length(self.distance(other))
    }

    /// Point halfway along the shorter arc. Undefined for antipodal points.
    pub fn mid_point(&self, other: &GeoPoint) -> GeoPoint {
        (*self + *other).normalize()
    }

    /// Point at `fraction` of the way along the shorter arc from `self` to `other`.
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        let angle = self.distance(other);
        let sin_angle = angle.sin();
        if sin_angle.abs() < f64::EPSILON {
            return *self;
        }
        let a = ((1.0 - fraction) * angle).sin() / sin_angle;
        let b = (fraction * angle).sin() / sin_angle;
        (*self * a + *other * b).normalize()
    }

    /// Initial course from `self` towards `other` in radians, clockwise from north, in [0, 2π).
    pub fn azimuth(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat_radians();
        let lat2 = other.lat_radians();
        let dlon = other.lon_radians() - self.lon_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        y.atan2(x).rem_euclid(2.0 * PI)
    }

    /// Calculate a target location from here by travelling along a `course` for a certain `distance`.
    ///
    /// - `course` is the direction to travel in, clockwise from north
    /// - `distance` is the length of the arc to cover; must be non-negative
    pub fn travel(&self, course: Angle, distance: Length) -> GeoPoint {
        let delta = length_to_radians(distance);
        debug_assert!(delta >= 0.0, "Can't travel a negative distance");
        self.offset(delta, course.get::<radian>())
    }

    /// Radian version of [travel](GeoPoint::travel).
    pub fn offset(&self, distance: f64, azimuth: f64) -> GeoPoint {
        let lat = self.lat_radians();
        let lon = self.lon_radians();
        let sin_lat2 = lat.sin() * distance.cos() + lat.cos() * distance.sin() * azimuth.cos();
        let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
        let lon2 = lon
            + (azimuth.sin() * distance.sin() * lat.cos())
                .atan2(distance.cos() - lat.sin() * sin_lat2);
        GeoPoint::from_radians(lat2, lon2)
    }

    /// `true` if this is one of the poles, where longitude is meaningless.
    pub fn is_pole(&self) -> bool {
        (FRAC_PI_2 - self.lat_radians().abs()).abs() < 1e-12
    }
}

impl Neg for GeoPoint {
    type Output = GeoPoint;

    fn neg(self) -> GeoPoint {
        GeoPoint {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Add for GeoPoint {
    type Output = GeoPoint;

    fn add(self, rhs: GeoPoint) -> GeoPoint {
        GeoPoint {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for GeoPoint {
    type Output = GeoPoint;

    fn sub(self, rhs: GeoPoint) -> GeoPoint {
        GeoPoint {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<f64> for GeoPoint {
    type Output = GeoPoint;

    fn mul(self, factor: f64) -> GeoPoint {
        GeoPoint {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }
}

impl AbsDiffEq for GeoPoint {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.lat_degrees();
        let lon = self.lon_degrees();
        let lat_dir = if lat >= 0.0 { "N" } else { "S" };
        let lon_dir = if lon >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "({}º{}, {}º{})",
            lat.abs(),
            lat_dir,
            lon.abs(),
            lon_dir
        )
    }
}

/// Parses `"(lat, lon)"` in decimal degrees. The parentheses are optional.
impl FromStr for GeoPoint {
    type Err = crate::GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords: Vec<&str> = s
            .trim()
            .trim_matches(|p| p == '(' || p == ')')
            .split(',')
            .map(str::trim)
            .collect();
        ensure!(
            coords.len() == 2,
            PositionFormatSnafu {
                input: s,
                description: "expected exactly two comma separated coordinates",
            }
        );
        let lat: f64 = coords[0]
            .parse()
            .context(NumberFormatSnafu { input: coords[0] })?;
        let lon: f64 = coords[1]
            .parse()
            .context(NumberFormatSnafu { input: coords[1] })?;
        GeoPoint::try_from_degrees(lat, lon)
    }
}
