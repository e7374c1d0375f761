// Prospect board loading.
//
// Every ranking source ships as a CSV board (rank, player, school, position).
// The primary board covers the full prospect pool; comparison boards only
// publish a top-N and are extended with the primary's tail so that every
// player appears on every board.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rankings::identity::{normalize_names, CanonicalNameMap};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One row of a ranking source's board. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectRecord {
    /// 1-based rank within the source's own board.
    pub rank: u32,
    pub name: String,
    pub school: String,
    pub position: String,
}

/// A comparison source's identity and loaded board.
#[derive(Debug, Clone)]
pub struct SourceBoard {
    /// Short source identifier from config (e.g. "espn", "pff").
    pub id: String,
    pub records: Vec<ProspectRecord>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("failed to read board file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("board file {path} contains no usable rows")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Raw board CSV row. Header: rank,player,school,position.
#[derive(Debug, Deserialize)]
struct RawBoardRow {
    rank: u32,
    player: String,
    school: String,
    position: String,
}

fn load_board_from_reader<R: Read>(rdr: R) -> Result<Vec<ProspectRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawBoardRow>() {
        match result {
            Ok(raw) => {
                if raw.player.trim().is_empty() {
                    warn!("skipping board row with empty player name (rank {})", raw.rank);
                    continue;
                }
                records.push(ProspectRecord {
                    rank: raw.rank,
                    name: raw.player.trim().to_string(),
                    school: raw.school.trim().to_string(),
                    position: raw.position.trim().to_string(),
                });
            }
            Err(e) => {
                warn!("skipping malformed board row: {}", e);
            }
        }
    }
    Ok(records)
}

/// Load a board CSV from `path`, in the source's published order.
pub fn load_board(path: &Path) -> Result<Vec<ProspectRecord>, BoardError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| BoardError::Io {
        path: display.clone(),
        source: e,
    })?;
    let records = load_board_from_reader(file).map_err(|e| BoardError::Csv {
        path: display.clone(),
        source: e,
    })?;
    if records.is_empty() {
        return Err(BoardError::Empty { path: display });
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// First-round draft order
// ---------------------------------------------------------------------------

/// Raw draft-order CSV row. Header: slot,team.
#[derive(Debug, Deserialize)]
struct RawOrderRow {
    slot: u32,
    team: String,
}

/// Load the slot -> franchise table for the first round. Used to label picks
/// and reveal rows; missing slots simply go unlabeled.
pub fn load_draft_order(path: &Path) -> Result<std::collections::BTreeMap<u32, String>, BoardError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| BoardError::Io {
        path: display.clone(),
        source: e,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut order = std::collections::BTreeMap::new();
    for result in reader.deserialize::<RawOrderRow>() {
        match result {
            Ok(raw) => {
                order.insert(raw.slot, raw.team.trim().to_string());
            }
            Err(e) => {
                warn!("skipping malformed draft order row: {}", e);
            }
        }
    }
    if order.is_empty() {
        return Err(BoardError::Empty { path: display });
    }
    Ok(order)
}

// ---------------------------------------------------------------------------
// Board extension
// ---------------------------------------------------------------------------

/// Extend a comparison source's top-N with the primary board's tail.
///
/// The source's own entries keep their published ranks (renormalized against
/// the primary's canonical spellings first, so the overlap check matches
/// alternate spellings of the same prospect). Primary players the source did
/// not rank are appended in primary order with ranks N+1, N+2, ... — after
/// this every player on the primary board appears on the returned board.
pub fn extend_with_primary(
    source_records: Vec<ProspectRecord>,
    primary: &[ProspectRecord],
    canonical: &CanonicalNameMap,
) -> Vec<ProspectRecord> {
    let mut extended = normalize_names(source_records, canonical);

    let ranked: HashSet<String> = extended.iter().map(|r| r.name.clone()).collect();
    let mut next_rank = extended.len() as u32;
    for record in primary {
        if ranked.contains(&record.name) {
            continue;
        }
        next_rank += 1;
        extended.push(ProspectRecord {
            rank: next_rank,
            ..record.clone()
        });
    }
    extended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: u32, name: &str, school: &str, position: &str) -> ProspectRecord {
        ProspectRecord {
            rank,
            name: name.to_string(),
            school: school.to_string(),
            position: position.to_string(),
        }
    }

    #[test]
    fn board_csv_roundtrip() {
        let csv_data = "\
rank,player,school,position
1,Fernando Mendoza,Indiana,QB
2,Rueben Bain Jr.,Miami (FL),EDGE
";
        let records = load_board_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[0].name, "Fernando Mendoza");
        assert_eq!(records[1].school, "Miami (FL)");
        assert_eq!(records[1].position, "EDGE");
    }

    #[test]
    fn board_csv_skips_malformed_rows() {
        let csv_data = "\
rank,player,school,position
1,Fernando Mendoza,Indiana,QB
not-a-rank,Broken Row,Nowhere,QB
3,Arvell Reese,Ohio State,LB
";
        let records = load_board_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Arvell Reese");
    }

    #[test]
    fn board_csv_skips_empty_names() {
        let csv_data = "\
rank,player,school,position
1,,Indiana,QB
2,Arvell Reese,Ohio State,LB
";
        let records = load_board_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Arvell Reese");
    }

    #[test]
    fn extend_appends_unranked_primary_players() {
        let primary = vec![
            record(1, "Fernando Mendoza", "Indiana", "QB"),
            record(2, "Rueben Bain Jr.", "Miami (FL)", "EDGE"),
            record(3, "Arvell Reese", "Ohio State", "LB"),
            record(4, "Kadyn Proctor", "Alabama", "OT"),
        ];
        let canonical = CanonicalNameMap::build(&primary);
        let source = vec![
            record(1, "Arvell Reese", "Ohio State", "LB"),
            record(2, "Fernando Mendoza", "Indiana", "QB"),
        ];

        let extended = extend_with_primary(source, &primary, &canonical);
        assert_eq!(extended.len(), 4);
        // Source's own ranks kept.
        assert_eq!(extended[0].name, "Arvell Reese");
        assert_eq!(extended[0].rank, 1);
        // Tail appended in primary order with ranks N+1...
        assert_eq!(extended[2].name, "Rueben Bain Jr.");
        assert_eq!(extended[2].rank, 3);
        assert_eq!(extended[3].name, "Kadyn Proctor");
        assert_eq!(extended[3].rank, 4);
    }

    #[test]
    fn extend_matches_alternate_spellings() {
        let primary = vec![
            record(1, "Rueben Bain Jr.", "Miami (FL)", "EDGE"),
            record(2, "Arvell Reese", "Ohio State", "LB"),
        ];
        let canonical = CanonicalNameMap::build(&primary);
        // Source spells Bain without the suffix; identity resolution must
        // recognize him as already ranked rather than appending a duplicate.
        let source = vec![record(1, "Rueben Bain", "Miami (FL)", "EDGE")];

        let extended = extend_with_primary(source, &primary, &canonical);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended[0].name, "Rueben Bain Jr.");
        assert_eq!(extended[1].name, "Arvell Reese");
        assert_eq!(extended[1].rank, 2);
    }
}
