use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{
    AmbiguousGroup, CandidateLink, CandidatePair, GameKey, MatchOutput, ResolvedObservation,
};

/// Candidate edge by batch position.
#[derive(Debug, Clone, Copy)]
struct Link {
    left: usize,
    right: usize,
    reversed: bool,
}

/// Pair left (source A) observations with right (source B) observations.
///
/// Left observations join on their direct key `(home, away, date)`. Right
/// observations offer their direct key and, only when they report a neutral
/// site, their reversed key `(away, home, date)`. A candidate is accepted only
/// if neither of its observations takes part in any other candidate; otherwise
/// every observation in the overlapping set goes to a multiply-matched group.
/// Observations with an unresolved team never join.
pub fn match_observations(left: &[ResolvedObservation], right: &[ResolvedObservation]) -> MatchOutput {
    let mut out = MatchOutput::default();

    let mut right_index: BTreeMap<GameKey, Vec<(usize, bool)>> = BTreeMap::new();
    for (ri, obs) in right.iter().enumerate() {
        let Some(key) = obs.key() else {
            out.unknown_right.push(obs.clone());
            continue;
        };
        right_index.entry(key).or_default().push((ri, false));
        // A team listed on both sides reverses to the same key.
        if obs.is_neutral() && key.home != key.away {
            right_index.entry(key.reversed()).or_default().push((ri, true));
        }
    }

    let mut links = Vec::new();
    let mut left_keys: HashMap<usize, GameKey> = HashMap::new();
    for (li, obs) in left.iter().enumerate() {
        let Some(key) = obs.key() else {
            out.unknown_left.push(obs.clone());
            continue;
        };
        left_keys.insert(li, key);
        if let Some(hits) = right_index.get(&key) {
            for &(ri, reversed) in hits {
                links.push(Link { left: li, right: ri, reversed });
            }
        }
    }

    let mut left_degree: HashMap<usize, usize> = HashMap::new();
    let mut right_degree: HashMap<usize, usize> = HashMap::new();
    for link in &links {
        *left_degree.entry(link.left).or_insert(0) += 1;
        *right_degree.entry(link.right).or_insert(0) += 1;
    }

    let (unique, ambiguous): (Vec<Link>, Vec<Link>) = links
        .into_iter()
        .partition(|l| left_degree[&l.left] == 1 && right_degree[&l.right] == 1);

    for link in &unique {
        out.pairs.push(CandidatePair {
            key: left_keys[&link.left],
            left: left[link.left].clone(),
            right: right[link.right].clone(),
            reversed: link.reversed,
        });
    }

    out.multiply_matched = group_ambiguous(&ambiguous, left, right);

    for (li, obs) in left.iter().enumerate() {
        if obs.is_resolved() && !left_degree.contains_key(&li) {
            out.unmatched_left.push(obs.clone());
        }
    }
    for (ri, obs) in right.iter().enumerate() {
        if obs.is_resolved() && !right_degree.contains_key(&ri) {
            out.unmatched_right.push(obs.clone());
        }
    }

    log::debug!(
        "matched {} pairs ({} reversed), {} multiply-matched groups, {}/{} unmatched, {}/{} unknown",
        out.pairs.len(),
        out.pairs.iter().filter(|p| p.reversed).count(),
        out.multiply_matched.len(),
        out.unmatched_left.len(),
        out.unmatched_right.len(),
        out.unknown_left.len(),
        out.unknown_right.len(),
    );

    out
}

/// Split ambiguous links into connected groups. Links arrive ordered by left
/// position, so groups come out ordered by their first left observation.
fn group_ambiguous(
    links: &[Link],
    left: &[ResolvedObservation],
    right: &[ResolvedObservation],
) -> Vec<AmbiguousGroup> {
    let mut by_left: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut by_right: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, link) in links.iter().enumerate() {
        by_left.entry(link.left).or_default().push(i);
        by_right.entry(link.right).or_default().push(i);
    }

    let mut seen = vec![false; links.len()];
    let mut groups = Vec::new();

    for start in 0..links.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut members = Vec::new();

        while let Some(i) = stack.pop() {
            members.push(i);
            let link = links[i];
            for &j in by_left[&link.left].iter().chain(&by_right[&link.right]) {
                if !seen[j] {
                    seen[j] = true;
                    stack.push(j);
                }
            }
        }
        members.sort_unstable();

        let left_ids: BTreeSet<usize> = members.iter().map(|&i| links[i].left).collect();
        let right_ids: BTreeSet<usize> = members.iter().map(|&i| links[i].right).collect();

        groups.push(AmbiguousGroup {
            left: left_ids.iter().map(|&i| left[i].clone()).collect(),
            right: right_ids.iter().map(|&i| right[i].clone()).collect(),
            links: members
                .iter()
                .map(|&i| CandidateLink {
                    left: left[links[i].left].id,
                    right: right[links[i].right].id,
                    reversed: links[i].reversed,
                })
                .collect(),
        });
    }

    groups
}
