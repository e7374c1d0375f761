// Cross-source player identity resolution.
//
// Different ranking outlets spell the same prospect differently ("Kevin
// Concepcion" vs "KC Concepcion", with or without a "Jr." suffix). A player
// is identified across boards by the (last name, position, school) triple;
// the primary board's spelling is the canonical one.

use std::collections::HashMap;

use crate::rankings::sources::ProspectRecord;

/// Generational suffixes ignored when extracting a last name.
const NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v"];

/// Identity of a prospect independent of how a source spells their name.
///
/// Two records with equal keys are the same real-world player. All components
/// are lowercased; the last name has generational suffixes stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub last_name: String,
    pub position: String,
    pub school: String,
}

impl IdentityKey {
    /// Derive the key for a record.
    pub fn of(record: &ProspectRecord) -> Self {
        IdentityKey {
            last_name: extract_last_name(&record.name),
            position: record.position.clone(),
            school: record.school.to_lowercase(),
        }
    }
}

/// Lowercased last name of `full_name`, ignoring generational suffixes.
/// Falls back to the whole lowercased name if nothing but suffixes remain.
pub fn extract_last_name(full_name: &str) -> String {
    full_name
        .to_lowercase()
        .split_whitespace()
        .filter(|part| !NAME_SUFFIXES.contains(part))
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| full_name.to_lowercase())
}

/// Lookup from identity key to the canonical display name.
#[derive(Debug, Clone, Default)]
pub struct CanonicalNameMap {
    names: HashMap<IdentityKey, String>,
}

impl CanonicalNameMap {
    /// Build the map from the authoritative board. First-seen wins: if the
    /// board itself lists a player twice under different spellings, the
    /// earlier entry is canonical. Duplicates are a data-quality wrinkle,
    /// not an error.
    pub fn build(authoritative: &[ProspectRecord]) -> Self {
        let mut names = HashMap::new();
        for record in authoritative {
            names
                .entry(IdentityKey::of(record))
                .or_insert_with(|| record.name.clone());
        }
        CanonicalNameMap { names }
    }

    /// The canonical spelling for `record`'s identity, if one is known.
    pub fn canonical_for(&self, record: &ProspectRecord) -> Option<&str> {
        self.names.get(&IdentityKey::of(record)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Rewrite each record's name to the canonical spelling where the identity
/// key matches; records with no match pass through untouched. Pure and
/// order-preserving, so applying it twice is the same as applying it once.
pub fn normalize_names(
    records: Vec<ProspectRecord>,
    canonical: &CanonicalNameMap,
) -> Vec<ProspectRecord> {
    records
        .into_iter()
        .map(|mut record| {
            if let Some(name) = canonical.canonical_for(&record) {
                if name != record.name {
                    record.name = name.to_string();
                }
            }
            record
        })
        .collect()
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
    fn last_name_plain() {
        assert_eq!(extract_last_name("Fernando Mendoza"), "mendoza");
    }

    #[test]
    fn last_name_ignores_suffixes() {
        assert_eq!(extract_last_name("Rueben Bain Jr."), "bain");
        assert_eq!(extract_last_name("Anthony Hill Jr"), "hill");
        assert_eq!(extract_last_name("Keith Abney II"), "abney");
        assert_eq!(extract_last_name("Trey Zuhn III"), "zuhn");
    }

    #[test]
    fn last_name_all_suffixes_falls_back() {
        assert_eq!(extract_last_name("Jr."), "jr.");
    }

    #[test]
    fn identity_key_matches_across_spellings() {
        let a = record(31, "KC Concepcion", "Texas A&M", "WR");
        let b = record(12, "Kevin Concepcion", "Texas A&M", "WR");
        assert_eq!(IdentityKey::of(&a), IdentityKey::of(&b));
    }

    #[test]
    fn identity_key_distinguishes_school() {
        // Two different Chris Johnsons.
        let a = record(43, "Chris Johnson", "San Diego State", "CB");
        let b = record(90, "Chris Johnson", "Georgia", "CB");
        assert_ne!(IdentityKey::of(&a), IdentityKey::of(&b));
    }

    #[test]
    fn first_seen_wins_on_duplicate_key() {
        let board = vec![
            record(1, "Rueben Bain Jr.", "Miami (FL)", "EDGE"),
            record(2, "Rueben Bain", "Miami (FL)", "EDGE"),
        ];
        let map = CanonicalNameMap::build(&board);
        assert_eq!(map.len(), 1);
        assert_eq!(map.canonical_for(&board[1]), Some("Rueben Bain Jr."));
    }

    #[test]
    fn normalize_rewrites_matching_names() {
        let primary = vec![record(31, "KC Concepcion", "Texas A&M", "WR")];
        let map = CanonicalNameMap::build(&primary);

        let source = vec![
            record(1, "Kevin Concepcion", "Texas A&M", "WR"),
            record(2, "Jordyn Tyson", "Arizona State", "WR"),
        ];
        let normalized = normalize_names(source, &map);
        assert_eq!(normalized[0].name, "KC Concepcion");
        // No identity match: passes through unchanged.
        assert_eq!(normalized[1].name, "Jordyn Tyson");
        // Ranks and order untouched.
        assert_eq!(normalized[0].rank, 1);
        assert_eq!(normalized[1].rank, 2);
    }

    #[test]
    fn normalize_is_idempotent() {
        let primary = vec![
            record(2, "Rueben Bain Jr.", "Miami (FL)", "EDGE"),
            record(31, "KC Concepcion", "Texas A&M", "WR"),
        ];
        let map = CanonicalNameMap::build(&primary);
        let source = vec![
            record(1, "Rueben Bain", "Miami (FL)", "EDGE"),
            record(2, "Kevin Concepcion", "Texas A&M", "WR"),
        ];
        let once = normalize_names(source, &map);
        let twice = normalize_names(once.clone(), &map);
        assert_eq!(once, twice);
    }
}
