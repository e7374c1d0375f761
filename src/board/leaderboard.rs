// Standings across all participants.

use crate::board::pick::{is_complete, Pick, TOTAL_SLOTS};
use crate::board::scoring::score_slate;
use crate::results::OfficialResults;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub participant: String,
    pub score: u32,
}

/// Pre-lock submission progress for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub participant: String,
    pub filled: u32,
    pub complete: bool,
}

/// Build the standings for the given slates against an official results map.
///
/// Only complete slates (all 32 slots filled) are ranked — a partial slate is
/// excluded entirely, not partially scored. Sorted descending by score; equal
/// scores keep the order the slates were supplied in (the store feeds them in
/// registration order), which is the documented tie-break.
///
/// `official` is caller-supplied so standings can be computed against the
/// simulator's revealed prefix without touching the persisted results.
pub fn build_leaderboard(
    slates: &[(String, Vec<Pick>)],
    official: &OfficialResults,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = slates
        .iter()
        .filter(|(_, picks)| is_complete(picks))
        .map(|(participant, picks)| Standing {
            participant: participant.clone(),
            score: score_slate(picks, official),
        })
        .collect();

    // Stable sort: ties keep submission order.
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

/// Submission progress for every participant, complete or not. Order follows
/// the input.
pub fn submission_status(counts: &[(String, u32)]) -> Vec<SubmissionStatus> {
    counts
        .iter()
        .map(|(participant, filled)| SubmissionStatus {
            participant: participant.clone(),
            filled: *filled,
            complete: *filled >= TOTAL_SLOTS,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn full_slate(names: impl Fn(u32) -> String) -> Vec<Pick> {
        (1..=32)
            .map(|slot| Pick {
                slot,
                player_name: Some(names(slot)),
                position: None,
                double_score: false,
            })
            .collect()
    }

    fn official_identity() -> OfficialResults {
        // Official result r: slot n went to "P<n>".
        (1..=32)
            .map(|n| (n, Some(format!("P{n}"))))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn partial_slates_are_excluded() {
        let mut partial = full_slate(|n| format!("P{n}"));
        partial[4].player_name = None;

        let slates = vec![
            ("amir".to_string(), partial),
            ("blake".to_string(), full_slate(|n| format!("P{n}"))),
        ];
        let standings = build_leaderboard(&slates, &official_identity());
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].participant, "blake");
        // Perfect slate: 32 exact picks.
        assert_eq!(standings[0].score, 96);
    }

    #[test]
    fn filling_the_last_slot_makes_a_participant_appear() {
        let mut slate = full_slate(|n| format!("P{n}"));
        slate[31].player_name = None;
        let mut slates = vec![("amir".to_string(), slate.clone())];
        assert!(build_leaderboard(&slates, &official_identity()).is_empty());

        slate[31].player_name = Some("P32".to_string());
        slates[0].1 = slate;
        let standings = build_leaderboard(&slates, &official_identity());
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].score, 96);
    }

    #[test]
    fn sorted_descending_by_score() {
        // "wrong" misses every pick by naming players not in the results.
        let slates = vec![
            ("wrong".to_string(), full_slate(|n| format!("X{n}"))),
            ("right".to_string(), full_slate(|n| format!("P{n}"))),
        ];
        let standings = build_leaderboard(&slates, &official_identity());
        assert_eq!(standings[0].participant, "right");
        assert_eq!(standings[1].participant, "wrong");
        assert_eq!(standings[1].score, 0);
    }

    #[test]
    fn ties_keep_submission_order() {
        let slates = vec![
            ("first".to_string(), full_slate(|n| format!("P{n}"))),
            ("second".to_string(), full_slate(|n| format!("P{n}"))),
            ("third".to_string(), full_slate(|n| format!("P{n}"))),
        ];
        let standings = build_leaderboard(&slates, &official_identity());
        let order: Vec<&str> = standings.iter().map(|s| s.participant.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_official_results_scores_everyone_zero() {
        let slates = vec![("amir".to_string(), full_slate(|n| format!("P{n}")))];
        let standings = build_leaderboard(&slates, &OfficialResults::new());
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].score, 0);
    }

    #[test]
    fn submission_status_counts() {
        let status = submission_status(&[
            ("amir".to_string(), 32),
            ("blake".to_string(), 5),
            ("casey".to_string(), 0),
        ]);
        assert!(status[0].complete);
        assert!(!status[1].complete);
        assert_eq!(status[2].filled, 0);
    }
}
