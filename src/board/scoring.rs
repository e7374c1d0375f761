// Slate scoring against official results.
//
// A pick earns 3/2/1 points for landing exactly on, one away from, or two
// away from the slot the player actually went at; the one designated
// double-score pick doubles its own contribution. Pure and deterministic.

use std::collections::HashMap;

use crate::board::pick::Pick;
use crate::results::OfficialResults;

/// Suffix tokens dropped from the end of a name when matching against
/// official results.
const MATCH_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Normalize a player name for matching picks to official results.
///
/// Lowercases, removes periods, collapses whitespace, and strips trailing
/// generational suffixes. Official feed entries carry no school or position,
/// so this is deliberately stricter than the identity key used for board
/// reconciliation: "C.J. Allen" and "CJ Allen Jr." both map to "cj allen".
pub fn match_key(name: &str) -> String {
    let folded = name.to_lowercase().replace('.', "");
    let mut tokens: Vec<&str> = folded.split_whitespace().collect();
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if MATCH_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }
    tokens.join(" ")
}

/// Base points for a pick `diff` slots away from the player's actual slot.
fn base_points(diff: u32) -> u32 {
    match diff {
        0 => 3,
        1 => 2,
        2 => 1,
        _ => 0,
    }
}

/// Score a participant's slate against an official results map.
///
/// Picks naming a player who has not gone (or who is absent from the map)
/// contribute 0 — pending, not an error. The result depends only on the
/// inputs, never on map iteration order.
pub fn score_slate(picks: &[Pick], official: &OfficialResults) -> u32 {
    let mut slot_by_player: HashMap<String, u32> = HashMap::new();
    for (&slot, name) in official {
        if let Some(name) = name {
            slot_by_player.insert(match_key(name), slot);
        }
    }

    let mut total = 0;
    for pick in picks {
        let Some(name) = &pick.player_name else {
            continue;
        };
        let Some(&actual_slot) = slot_by_player.get(&match_key(name)) else {
            continue;
        };
        let diff = pick.slot.abs_diff(actual_slot);
        let mult = if pick.double_score { 2 } else { 1 };
        total += base_points(diff) * mult;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pick(slot: u32, name: &str) -> Pick {
        Pick {
            slot,
            player_name: Some(name.to_string()),
            position: None,
            double_score: false,
        }
    }

    fn official(entries: &[(u32, &str)]) -> OfficialResults {
        entries
            .iter()
            .map(|&(slot, name)| (slot, Some(name.to_string())))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn match_key_folds_case_periods_and_whitespace() {
        assert_eq!(match_key("C.J. Allen"), "cj allen");
        assert_eq!(match_key("  Fernando   Mendoza "), "fernando mendoza");
    }

    #[test]
    fn match_key_strips_trailing_suffixes() {
        assert_eq!(match_key("Rueben Bain Jr."), "rueben bain");
        assert_eq!(match_key("Anthony Hill Jr"), "anthony hill");
        assert_eq!(match_key("Trey Zuhn III"), "trey zuhn");
        assert_eq!(match_key("Keith Abney II"), "keith abney");
    }

    #[test]
    fn match_key_keeps_lone_suffix_lookalike() {
        // A single-token name is never stripped to nothing.
        assert_eq!(match_key("V"), "v");
    }

    #[test]
    fn exact_slot_scores_three() {
        let official = official(&[(1, "Fernando Mendoza")]);
        assert_eq!(score_slate(&[pick(1, "Fernando Mendoza")], &official), 3);
    }

    #[test]
    fn near_misses_score_two_and_one() {
        let official = official(&[(5, "Caleb Downs")]);
        assert_eq!(score_slate(&[pick(4, "Caleb Downs")], &official), 2);
        assert_eq!(score_slate(&[pick(6, "Caleb Downs")], &official), 2);
        assert_eq!(score_slate(&[pick(3, "Caleb Downs")], &official), 1);
        assert_eq!(score_slate(&[pick(7, "Caleb Downs")], &official), 1);
    }

    #[test]
    fn three_or_more_away_scores_zero() {
        let official = official(&[(10, "Caleb Downs")]);
        assert_eq!(score_slate(&[pick(13, "Caleb Downs")], &official), 0);
        assert_eq!(score_slate(&[pick(1, "Caleb Downs")], &official), 0);
    }

    #[test]
    fn unmatched_name_scores_zero() {
        let official = official(&[(1, "Fernando Mendoza")]);
        assert_eq!(score_slate(&[pick(1, "Ty Simpson")], &official), 0);
    }

    #[test]
    fn empty_pick_scores_zero() {
        let official = official(&[(1, "Fernando Mendoza")]);
        let empty = Pick {
            slot: 1,
            player_name: None,
            position: None,
            double_score: false,
        };
        assert_eq!(score_slate(&[empty], &official), 0);
    }

    #[test]
    fn double_score_doubles_contribution() {
        let official = official(&[(15, "Jeremiyah Love")]);
        let mut p = pick(15, "Jeremiyah Love");
        p.double_score = true;
        assert_eq!(score_slate(&[p], &official), 6);
    }

    #[test]
    fn spelling_variants_still_match() {
        let official = official(&[(2, "Rueben Bain")]);
        assert_eq!(score_slate(&[pick(2, "Rueben Bain Jr.")], &official), 3);
    }

    #[test]
    fn null_official_slots_are_pending() {
        let mut official = official(&[(1, "Fernando Mendoza")]);
        official.insert(2, None);
        let slate = vec![pick(1, "Fernando Mendoza"), pick(2, "Arvell Reese")];
        assert_eq!(score_slate(&slate, &official), 3);
    }

    #[test]
    fn contributions_sum_across_slots() {
        let official = official(&[(1, "Fernando Mendoza"), (2, "Rueben Bain Jr."), (3, "Arvell Reese")]);
        let slate = vec![
            pick(1, "Fernando Mendoza"), // exact: 3
            pick(3, "Rueben Bain Jr."),  // off by one: 2
            pick(5, "Arvell Reese"),     // off by two: 1
        ];
        assert_eq!(score_slate(&slate, &official), 6);
    }
}
