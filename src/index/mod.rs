//! Narrowing down candidate collections before the exact tests.
use crate::geo::{BoundingCircle, Extent};
use std::fmt;

pub mod r_tree;
mod rtree_extent_index;

pub use rtree_extent_index::RTreeExtentIndex;

/// A collection of extents that can pick out the ones that might come near a query.
pub trait ExtentIndex {
    /// All extents whose bounding circles may intersect `query`, possibly more.
    ///
    /// Must never omit an extent whose bounding circle intersects `query`.
    fn iter_candidates<'s>(
        &'s self,
        query: &BoundingCircle,
    ) -> Box<dyn Iterator<Item = &'s Extent> + 's>;

    /// Total number of extents in the index
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The trivial index, every extent is a candidate.
impl ExtentIndex for [Extent] {
    fn iter_candidates<'s>(
        &'s self,
        _query: &BoundingCircle,
    ) -> Box<dyn Iterator<Item = &'s Extent> + 's> {
        Box::new(self.iter())
    }

    fn len(&self) -> usize {
        <[Extent]>::len(self)
    }
}

/// The candidates of a bulk query.
#[derive(Clone, Copy)]
pub enum CandidateSet<'a> {
    /// No index, every candidate is looked at.
    Scan(&'a [Extent]),
    Indexed(&'a (dyn ExtentIndex + Sync)),
}

impl<'a> CandidateSet<'a> {
    /// Candidates that may come within the circle `query`.
    pub fn narrow(&self, query: &BoundingCircle) -> Box<dyn Iterator<Item = &'a Extent> + 'a> {
        match *self {
            CandidateSet::Scan(extents) => extents.iter_candidates(query),
            CandidateSet::Indexed(index) => index.iter_candidates(query),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CandidateSet::Scan(extents) => extents.len(),
            CandidateSet::Indexed(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CandidateSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSet::Scan(extents) => write!(f, "Scan({} extents)", extents.len()),
            CandidateSet::Indexed(index) => write!(f, "Indexed({} extents)", index.len()),
        }
    }
}

impl<'a> From<&'a [Extent]> for CandidateSet<'a> {
    fn from(extents: &'a [Extent]) -> Self {
        CandidateSet::Scan(extents)
    }
}

impl<'a> From<&'a Vec<Extent>> for CandidateSet<'a> {
    fn from(extents: &'a Vec<Extent>) -> Self {
        CandidateSet::Scan(extents.as_slice())
    }
}

impl<'a> From<&'a RTreeExtentIndex> for CandidateSet<'a> {
    fn from(index: &'a RTreeExtentIndex) -> Self {
        CandidateSet::Indexed(index)
    }
}
