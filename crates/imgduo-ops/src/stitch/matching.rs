//! Brute-force descriptor matching.

use super::features::Feature;
use rayon::prelude::*;
use tracing::trace;

/// A correspondence between a query and a train feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Index into the query set.
    pub query: usize,
    /// Index into the train set.
    pub train: usize,
    /// Hamming distance.
    pub distance: u32,
}

/// Best and second-best train index for one query.
fn two_nearest(query: &Feature, train: &[Feature]) -> Option<(usize, u32, u32)> {
    let mut best: Option<(usize, u32)> = None;
    let mut second = u32::MAX;
    for (i, t) in train.iter().enumerate() {
        let d = query.descriptor.hamming(&t.descriptor);
        match best {
            Some((_, bd)) if d >= bd => second = second.min(d),
            _ => {
                if let Some((_, bd)) = best {
                    second = bd;
                }
                best = Some((i, d));
            }
        }
    }
    best.map(|(i, d)| (i, d, second))
}

/// Matches `query` against `train`.
///
/// A match is kept when its distance is below `ratio` times the second best
/// (Lowe's test) and the train feature's own best match is the same query
/// (cross-check). Results are ordered by query index.
pub fn match_features(query: &[Feature], train: &[Feature], ratio: f32) -> Vec<Match> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }
    let backward: Vec<Option<usize>> = train
        .par_iter()
        .map(|t| two_nearest(t, query).map(|(i, _, _)| i))
        .collect();

    let matches: Vec<Match> = query
        .par_iter()
        .enumerate()
        .filter_map(|(qi, q)| {
            let (ti, best, second) = two_nearest(q, train)?;
            let distinct = second == u32::MAX || (best as f32) < ratio * second as f32;
            (distinct && backward[ti] == Some(qi)).then_some(Match {
                query: qi,
                train: ti,
                distance: best,
            })
        })
        .collect();
    trace!(query = query.len(), train = train.len(), kept = matches.len(), "match_features");
    matches
}
