//! Flat lat/lon geometry backing the spatial index.
pub mod planar;
pub mod spherical;

/// Types implementing this trait can be checked for intersections with `Rhs`
pub trait Intersecting<Rhs = Self> {
    type IntersectionShape;
    /// Returns `true` if `self` intersects with `other`.
    fn intersects(&self, other: &Rhs) -> bool;
    /// Produce the shape of the intersection, if there is one with a non-zero area
    fn intersection(&self, other: &Rhs) -> Option<Self::IntersectionShape>;
    /// Returns true if `other` not only intersects `self`, but is completely
    /// contained within the confines of this shape
    fn contains(&self, other: &Rhs) -> bool;
}

/// Can produce an area
pub trait HasArea {
    /// Area of this geometry
    ///
    /// Planar shapes use squared degrees, which only make sense for comparisons.
    fn area(&self) -> f64;
}

pub trait Extending<Rhs = Self>
where
    Rhs: HasArea,
{
    /// Produces a new geometry of the given type
    /// that is like `geometry`, but extended to fit `self`
    fn extend(&self, geometry: Rhs) -> Rhs;

    /// Same is extend, but only return the additional area
    fn extend_area(&self, geometry: Rhs) -> f64 {
        let original_area = geometry.area();
        let extended = self.extend(geometry);
        let extended_area = extended.area();
        extended_area - original_area
    }
}
