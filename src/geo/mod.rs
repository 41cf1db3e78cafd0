//! Geometry on the unit sphere: locations, vertex sequences, bounding circles and the extents
//! that take part in intersection queries.
use uom::si::{f64::*, length::kilometer};

mod array;
mod bounding_circle;
mod extent;
mod point;

pub use array::GeoArray;
pub use bounding_circle::BoundingCircle;
pub use extent::{
    Extent,
    ExtentId,
    ExtentKind,
    ExtentRef,
    GeoExtent,
    GeoLocation,
    GeoPath,
    GeoRegion,
    GeoSegment,
    Segments,
};
pub use point::GeoPoint;

/// Mean earth radius used to convert between angles and surface distances.
pub const EARTH_RADIUS_KM: f64 = 6371.009;

/// Convert a distance along the surface into an angle at the centre of the earth.
pub fn length_to_radians(distance: Length) -> f64 {
    distance.get::<kilometer>() / EARTH_RADIUS_KM
}

/// Convert an angle at the centre of the earth into a distance along the surface.
pub fn radians_to_length(angle: f64) -> Length {
    Length::new::<kilometer>(angle * EARTH_RADIUS_KM)
}
