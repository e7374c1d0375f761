// Consensus ranking across sources.
//
// Two fusion algorithms over the same five boards (primary + four comparison
// sources). Reciprocal rank fusion rewards a very high rank on any single
// board; average position rewards broad agreement. Both are exposed — the
// caller picks which ordering to present.

use std::collections::HashMap;

use crate::rankings::identity::{normalize_names, CanonicalNameMap};
use crate::rankings::sources::{ProspectRecord, SourceBoard};

/// One row of a derived consensus ordering. `rank` is the entry's position in
/// the fused output, not any source's published rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusEntry {
    pub rank: u32,
    pub name: String,
    pub school: String,
    pub position: String,
}

/// Default damping constant for reciprocal rank fusion.
pub const DEFAULT_RRF_K: u32 = 60;

struct Accum {
    score: f64,
    rank_sum: f64,
    appearances: u32,
    school: String,
    position: String,
}

/// Fold all boards into one per-player accumulator map, normalizing every
/// comparison board against the primary's canonical spellings first.
/// School/position metadata comes from the first record seen for a player.
fn accumulate(
    primary: &[ProspectRecord],
    comparisons: &[SourceBoard],
    k: u32,
) -> HashMap<String, Accum> {
    let canonical = CanonicalNameMap::build(primary);

    let mut boards: Vec<Vec<ProspectRecord>> = Vec::with_capacity(comparisons.len() + 1);
    boards.push(primary.to_vec());
    for board in comparisons {
        boards.push(normalize_names(board.records.clone(), &canonical));
    }

    let mut accums: HashMap<String, Accum> = HashMap::new();
    for board in &boards {
        for record in board {
            let entry = accums
                .entry(record.name.clone())
                .or_insert_with(|| Accum {
                    score: 0.0,
                    rank_sum: 0.0,
                    appearances: 0,
                    school: record.school.clone(),
                    position: record.position.clone(),
                });
            entry.score += 1.0 / f64::from(k + record.rank);
            entry.rank_sum += f64::from(record.rank);
            entry.appearances += 1;
        }
    }
    accums
}

/// Reciprocal rank fusion: each player scores `Σ 1/(k + rank)` over every
/// board they appear on. Missing appearances simply contribute no term —
/// there is no zero-fill penalty. Sorted descending by score; ties break by
/// name so the ordering is total and reproducible.
///
/// The primary board is caller-supplied so a live, admin-refreshed version
/// can replace the static file without touching the algorithm. `k` damps the
/// influence of any single extreme ranking (config default 60).
pub fn rrf_consensus(
    primary: &[ProspectRecord],
    comparisons: &[SourceBoard],
    k: u32,
) -> Vec<ConsensusEntry> {
    let accums = accumulate(primary, comparisons, k);

    let mut scored: Vec<(String, Accum)> = accums.into_iter().collect();
    scored.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    to_entries(scored)
}

/// Average-position consensus: the arithmetic mean of a player's published
/// rank over the boards they appear on, sorted ascending (lower mean wins).
///
/// Where RRF lets one very early rank carry a player, this favors broad
/// agreement: rank 10 on every board beats rank 1 on one board and rank 50
/// on the rest.
pub fn average_position_consensus(
    primary: &[ProspectRecord],
    comparisons: &[SourceBoard],
) -> Vec<ConsensusEntry> {
    let accums = accumulate(primary, comparisons, DEFAULT_RRF_K);

    let mut scored: Vec<(String, Accum)> = accums.into_iter().collect();
    scored.sort_by(|a, b| {
        let mean_a = a.1.rank_sum / f64::from(a.1.appearances.max(1));
        let mean_b = b.1.rank_sum / f64::from(b.1.appearances.max(1));
        mean_a
            .partial_cmp(&mean_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    to_entries(scored)
}

fn to_entries(scored: Vec<(String, Accum)>) -> Vec<ConsensusEntry> {
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (name, accum))| ConsensusEntry {
            rank: i as u32 + 1,
            name,
            school: accum.school,
            position: accum.position,
        })
        .collect()
}
