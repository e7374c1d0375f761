// A participant's mock-draft slate.
//
// Submissions arrive from an untrusted boundary, so every slate is repaired
// into a well-formed one before it is stored or scored: slots stay within the
// first round, the double-score flag obeys its slot floor and exclusivity
// rule, and no player occupies two slots.

use serde::{Deserialize, Serialize};

use crate::board::scoring::match_key;

/// Number of slots in a complete slate (the full first round).
pub const TOTAL_SLOTS: u32 = 32;

/// Lowest slot allowed to carry the double-score flag.
pub const DOUBLE_SCORE_MIN_SLOT: u32 = 12;

/// One slot of a participant's slate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    /// Slot number, 1-based.
    pub slot: u32,
    /// Predicted player for this slot; `None` while the slot is unfilled.
    pub player_name: Option<String>,
    /// Position string as submitted (e.g. "QB", "EDGE").
    pub position: Option<String>,
    /// Whether this slot's contribution is doubled when scored.
    pub double_score: bool,
}

impl Pick {
    /// An unfilled slot.
    pub fn empty(slot: u32) -> Self {
        Pick {
            slot,
            player_name: None,
            position: None,
            double_score: false,
        }
    }

    fn clear_player(&mut self) {
        self.player_name = None;
        self.position = None;
        self.double_score = false;
    }
}

/// Repair a submitted slate into a well-formed one. Deterministic and total —
/// malformed input is normalized, never rejected.
///
/// Rules, applied in slot order:
/// - slots outside 1..=32 are dropped;
/// - a slot submitted twice keeps its first submission;
/// - `double_score` is cleared on slots below 12;
/// - if several slots carry `double_score`, the lowest-numbered keeps it;
/// - if two slots resolve to the same player (by scoring match key), the
///   lower slot keeps the player and the later one is cleared.
///
/// The returned slate is sorted by slot.
pub fn normalize_slate(picks: Vec<Pick>) -> Vec<Pick> {
    use std::collections::btree_map::Entry;
    use std::collections::{BTreeMap, HashSet};

    let mut by_slot: BTreeMap<u32, Pick> = BTreeMap::new();
    for pick in picks {
        if pick.slot < 1 || pick.slot > TOTAL_SLOTS {
            continue;
        }
        if let Entry::Vacant(entry) = by_slot.entry(pick.slot) {
            entry.insert(pick);
        }
    }

    let mut seen_players: HashSet<String> = HashSet::new();
    let mut double_taken = false;
    let mut slate: Vec<Pick> = Vec::with_capacity(by_slot.len());

    for (_, mut pick) in by_slot {
        if let Some(name) = &pick.player_name {
            if !seen_players.insert(match_key(name)) {
                pick.clear_player();
            }
        }

        if pick.double_score {
            if pick.slot < DOUBLE_SCORE_MIN_SLOT || double_taken {
                pick.double_score = false;
            } else {
                double_taken = true;
            }
        }

        slate.push(pick);
    }

    slate
}

/// Whether a (normalized) slate fills all 32 slots with a player.
pub fn is_complete(slate: &[Pick]) -> bool {
    let filled = slate
        .iter()
        .filter(|p| p.slot >= 1 && p.slot <= TOTAL_SLOTS && p.player_name.is_some())
        .map(|p| p.slot)
        .collect::<std::collections::HashSet<_>>();
    filled.len() as u32 == TOTAL_SLOTS
}
