use crate::geo::{ExtentId, ExtentRef, GeoExtent};
use rustc_hash::FxHashSet;
use std::iter;

/// Records the matches found by a query.
pub trait MatchCollector<'a> {
    fn collect(&mut self, query: ExtentRef<'a>, candidate: ExtentRef<'a>);
}

impl<'a, C: MatchCollector<'a> + ?Sized> MatchCollector<'a> for &mut C {
    fn collect(&mut self, query: ExtentRef<'a>, candidate: ExtentRef<'a>) {
        (**self).collect(query, candidate)
    }
}

/// Which candidates matched, no matter which part of the query matched them.
///
/// Candidates are deduplicated by id and kept in the order they were first found.
#[derive(Debug, Clone, Default)]
pub struct SetMatchCollector<'a> {
    seen: FxHashSet<ExtentId>,
    matches: Vec<ExtentRef<'a>>,
}

impl<'a> SetMatchCollector<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn contains(&self, id: ExtentId) -> bool {
        self.seen.contains(&id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtentRef<'a>> {
        self.matches.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ExtentId> + '_ {
        self.matches.iter().map(|m| m.id())
    }
}

impl<'a> MatchCollector<'a> for SetMatchCollector<'a> {
    fn collect(&mut self, _query: ExtentRef<'a>, candidate: ExtentRef<'a>) {
        if self.seen.insert(candidate.id()) {
            self.matches.push(candidate);
        }
    }
}

impl<'a> IntoIterator for SetMatchCollector<'a> {
    type Item = ExtentRef<'a>;
    type IntoIter = std::vec::IntoIter<ExtentRef<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// Every `(query, candidate)` pair in discovery order, duplicates included.
#[derive(Debug, Clone, Default)]
pub struct PairArrayMatchCollector<'a> {
    pairs: Vec<(ExtentRef<'a>, ExtentRef<'a>)>,
}

impl<'a> PairArrayMatchCollector<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(ExtentRef<'a>, ExtentRef<'a>)] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (ExtentRef<'a>, ExtentRef<'a>)> {
        self.pairs.iter()
    }
}

impl<'a> MatchCollector<'a> for PairArrayMatchCollector<'a> {
    fn collect(&mut self, query: ExtentRef<'a>, candidate: ExtentRef<'a>) {
        self.pairs.push((query, candidate));
    }
}

impl<'a> IntoIterator for PairArrayMatchCollector<'a> {
    type Item = (ExtentRef<'a>, ExtentRef<'a>);
    type IntoIter = std::vec::IntoIter<(ExtentRef<'a>, ExtentRef<'a>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// Appends every matched candidate to a collection owned by the caller.
///
/// No deduplication and no pairing. The collector adds no synchronisation of its own,
/// sharing the target between threads is up to the caller.
#[derive(Debug)]
pub struct CollectionMatchCollector<'c, C> {
    target: &'c mut C,
}

impl<'c, C> CollectionMatchCollector<'c, C> {
    pub fn new(target: &'c mut C) -> Self {
        CollectionMatchCollector { target }
    }
}

impl<'a, 'c, C> MatchCollector<'a> for CollectionMatchCollector<'c, C>
where
    C: Extend<ExtentRef<'a>>,
{
    fn collect(&mut self, _query: ExtentRef<'a>, candidate: ExtentRef<'a>) {
        self.target.extend(iter::once(candidate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{GeoLocation, GeoPoint};

    fn locations() -> (GeoLocation, GeoLocation, GeoLocation) {
        (
            GeoLocation::new(GeoPoint::from_degrees(0.0, 0.0)),
            GeoLocation::new(GeoPoint::from_degrees(1.0, 0.0)),
            GeoLocation::new(GeoPoint::from_degrees(2.0, 0.0)),
        )
    }

    #[test]
    fn test_set_deduplicates_candidates() {
        let (a, b1, b2) = locations();
        let mut collector = SetMatchCollector::new();
        collector.collect((&a).into(), (&b1).into());
        collector.collect((&a).into(), (&b2).into());
        collector.collect((&a).into(), (&b1).into());
        assert_eq!(2, collector.len());
        assert!(collector.contains(b1.id()));
        assert!(!collector.contains(a.id()));
        let ids: Vec<ExtentId> = collector.ids().collect();
        assert_eq!(vec![b1.id(), b2.id()], ids);
        assert_eq!(2, collector.into_iter().count());
    }

    #[test]
    fn test_pairs_keep_duplicates() {
        let (a, b1, b2) = locations();
        let mut collector = PairArrayMatchCollector::new();
        collector.collect((&a).into(), (&b1).into());
        collector.collect((&b2).into(), (&b1).into());
        collector.collect((&a).into(), (&b1).into());
        assert_eq!(3, collector.len());
        let (query, candidate) = collector.pairs()[1];
        assert_eq!(b2.id(), query.id());
        assert_eq!(b1.id(), candidate.id());
    }

    #[test]
    fn test_collection_appends() {
        let (a, b1, b2) = locations();
        let mut target: Vec<ExtentRef<'_>> = Vec::new();
        {
            let mut collector = CollectionMatchCollector::new(&mut target);
            collector.collect((&a).into(), (&b1).into());
            collector.collect((&a).into(), (&b1).into());
            collector.collect((&a).into(), (&b2).into());
        }
        assert_eq!(3, target.len());
        assert_eq!(b2.id(), target[2].id());
    }
}
