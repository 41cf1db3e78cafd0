//! Many queries against the same candidates, spread over the rayon thread pool.
use crate::{
    geo::Extent,
    index::CandidateSet,
    intersection::{collector::SetMatchCollector, filter::MatchParameters, Intersection},
};
use rayon::prelude::*;

/// Match every query against `candidates`, returning one set of matches per query in query order.
///
/// Each query runs on its own [Intersection], so nothing is shared between threads except the
/// read-only candidates.
pub fn match_sets<'a>(
    queries: &'a [Extent],
    candidates: CandidateSet<'a>,
    params: MatchParameters,
) -> Vec<SetMatchCollector<'a>> {
    let start = std::time::Instant::now();
    let results: Vec<SetMatchCollector<'a>> = queries
        .par_iter()
        .map(|query| {
            let mut intersection = Intersection::with_parameters(params);
            intersection.consider(query, candidates);
            intersection.into_collector()
        })
        .collect();
    log::debug!(
        "Matched {} queries against {} candidates ({}) in {}ms, {} matches in total",
        queries.len(),
        candidates.len(),
        params,
        start.elapsed().as_millis(),
        results.iter().map(|r| r.len()).sum::<usize>()
    );
    results
}
