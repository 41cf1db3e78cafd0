use super::{r_tree::RTree, ExtentIndex};
use crate::{
    geo::{BoundingCircle, Extent, GeoExtent},
    geometry::{planar::Rectangle, spherical::BoundingBox},
};
use get_size::GetSize;
use itertools::Itertools;

/// Position of an extent, filed under one of the rectangles covering its bounding circle.
#[derive(Debug, Clone, Copy, GetSize)]
struct IndexEntry {
    bounds: Rectangle,
    slot: usize,
}

impl AsRef<Rectangle> for IndexEntry {
    fn as_ref(&self) -> &Rectangle {
        &self.bounds
    }
}

/// Owns a collection of extents and indexes them by the lon/lat boxes around their
/// bounding circles.
///
/// Extents crossing the antimeridian are filed under two rectangles, extents around a pole
/// under a polar cap.
#[derive(Debug, Clone, Default)]
pub struct RTreeExtentIndex {
    extents: Vec<Extent>,
    tree: RTree<IndexEntry>,
}

impl RTreeExtentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RTreeExtentIndex {
            extents: Vec::with_capacity(capacity),
            tree: RTree::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, extent: Extent) {
        let slot = self.extents.len();
        let bounds = BoundingBox::from_circle(&extent.bounding_circle());
        for rectangle in bounds.to_rectangles() {
            self.tree.insert(IndexEntry {
                bounds: rectangle,
                slot,
            });
        }
        self.extents.push(extent);
    }

    /// All extents in insertion order
    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    /// Bytes on the heap, for the extents and the tree together.
    pub fn heap_size(&self) -> usize {
        self.extents.get_heap_size() + self.tree.get_heap_size()
    }

    pub fn log_stats(&self) {
        log::info!(
            "Index holds {} extents under {} rectangles in {} nodes, using {}B on the heap ({}B for the tree)",
            self.extents.len(),
            self.tree.len(),
            self.tree.node_count(),
            self.heap_size(),
            self.tree.get_heap_size()
        );
    }
}

impl ExtentIndex for RTreeExtentIndex {
    fn iter_candidates<'s>(
        &'s self,
        query: &BoundingCircle,
    ) -> Box<dyn Iterator<Item = &'s Extent> + 's> {
        let search_box = BoundingBox::from_circle(query);
        // extents filed under several rectangles can be found more than once
        let slots: Vec<usize> = self
            .tree
            .search(&search_box)
            .into_iter()
            .map(|entry| entry.slot)
            .sorted_unstable()
            .dedup()
            .collect();
        log::trace!(
            "Narrowed {} extents down to {} candidates",
            self.extents.len(),
            slots.len()
        );
        Box::new(slots.into_iter().map(move |slot| &self.extents[slot]))
    }

    fn len(&self) -> usize {
        self.extents.len()
    }
}

impl FromIterator<Extent> for RTreeExtentIndex {
    fn from_iter<I: IntoIterator<Item = Extent>>(iter: I) -> Self {
        let mut index = RTreeExtentIndex::new();
        index.extend(iter);
        index.log_stats();
        index
    }
}

impl Extend<Extent> for RTreeExtentIndex {
    fn extend<I: IntoIterator<Item = Extent>>(&mut self, iter: I) {
        for extent in iter {
            self.insert(extent);
        }
    }
}
