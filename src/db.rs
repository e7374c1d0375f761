// SQLite persistence for participants, slates, boards, and official results.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::board::pick::{normalize_slate, Pick};
use crate::rankings::sources::ProspectRecord;
use crate::results::OfficialResults;
use crate::sim::SimulationState;

/// A registered player of the prediction game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: i64,
    pub handle: String,
    pub display_name: String,
}

/// SQLite-backed store. All access goes through a single connection behind a
/// mutex, so writers are serialized.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS participants (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                handle       TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS picks (
                participant_id INTEGER NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
                year           INTEGER NOT NULL,
                slot           INTEGER NOT NULL,
                player_name    TEXT NOT NULL,
                position       TEXT,
                double_score   INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (participant_id, year, slot)
            );

            CREATE TABLE IF NOT EXISTS official_results (
                year        INTEGER NOT NULL,
                slot        INTEGER NOT NULL,
                player_name TEXT,
                team_name   TEXT,
                PRIMARY KEY (year, slot)
            );

            CREATE TABLE IF NOT EXISTS board_players (
                year        INTEGER NOT NULL,
                rank        INTEGER NOT NULL,
                player_name TEXT NOT NULL,
                school      TEXT NOT NULL,
                position    TEXT NOT NULL,
                PRIMARY KEY (year, rank)
            );

            CREATE TABLE IF NOT EXISTS settings (
                year      INTEGER PRIMARY KEY,
                locked_at TEXT
            );

            CREATE TABLE IF NOT EXISTS app_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // -- Participants --------------------------------------------------------

    /// Register a participant or refresh their display name. Returns the row
    /// id either way.
    pub fn upsert_participant(&self, handle: &str, display_name: &str) -> Result<i64> {
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO participants (handle, display_name)
                 VALUES (?1, ?2)
                 ON CONFLICT(handle) DO UPDATE SET display_name = excluded.display_name
                 RETURNING id",
                params![handle, display_name],
                |row| row.get(0),
            )
            .context("failed to upsert participant")?;
        Ok(id)
    }

    /// All participants in registration order.
    pub fn list_participants(&self) -> Result<Vec<Participant>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, handle, display_name FROM participants ORDER BY id")
            .context("failed to prepare participant query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Participant {
                    id: row.get(0)?,
                    handle: row.get(1)?,
                    display_name: row.get(2)?,
                })
            })
            .context("failed to query participants")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map participant rows")?;
        Ok(rows)
    }

    pub fn find_participant(&self, handle: &str) -> Result<Option<Participant>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, handle, display_name FROM participants WHERE handle = ?1",
            params![handle],
            |row| {
                Ok(Participant {
                    id: row.get(0)?,
                    handle: row.get(1)?,
                    display_name: row.get(2)?,
                })
            },
        )
        .optional()
        .context("failed to look up participant")
    }

    // -- Slates --------------------------------------------------------------

    /// Replace a participant's slate for `year`. The slate is repaired
    /// through `normalize_slate` on the way in, so stored picks always
    /// satisfy the slot and double-score invariants; unfilled slots are not
    /// stored. Rejected once the year is locked.
    pub fn save_slate(&self, participant_id: i64, year: u16, picks: Vec<Pick>) -> Result<()> {
        if self.is_locked(year)? {
            bail!("draft {year} is locked; slates are read-only");
        }

        let slate = normalize_slate(picks);
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin slate transaction")?;
        tx.execute(
            "DELETE FROM picks WHERE participant_id = ?1 AND year = ?2",
            params![participant_id, year],
        )
        .context("failed to clear previous slate")?;
        for pick in slate.iter().filter(|p| p.player_name.is_some()) {
            tx.execute(
                "INSERT INTO picks (participant_id, year, slot, player_name, position, double_score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    participant_id,
                    year,
                    pick.slot,
                    pick.player_name,
                    pick.position,
                    pick.double_score,
                ],
            )
            .context("failed to insert pick")?;
        }
        tx.commit().context("failed to commit slate")?;
        Ok(())
    }

    /// A participant's stored slate for `year`, ordered by slot. Only filled
    /// slots are returned.
    pub fn load_slate(&self, participant_id: i64, year: u16) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT slot, player_name, position, double_score
                 FROM picks WHERE participant_id = ?1 AND year = ?2 ORDER BY slot",
            )
            .context("failed to prepare slate query")?;
        let picks = stmt
            .query_map(params![participant_id, year], |row| {
                Ok(Pick {
                    slot: row.get(0)?,
                    player_name: row.get(1)?,
                    position: row.get(2)?,
                    double_score: row.get(3)?,
                })
            })
            .context("failed to query slate")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;
        Ok(picks)
    }

    /// Every participant's slate for `year`, in registration order (the
    /// leaderboard's tie-break order).
    pub fn load_all_slates(&self, year: u16) -> Result<Vec<(String, Vec<Pick>)>> {
        let participants = self.list_participants()?;
        let mut slates = Vec::with_capacity(participants.len());
        for participant in participants {
            let picks = self.load_slate(participant.id, year)?;
            slates.push((participant.display_name, picks));
        }
        Ok(slates)
    }

    /// Filled-pick counts per participant for `year`, in registration order.
    /// Participants with no picks are included with a count of 0.
    pub fn pick_counts(&self, year: u16) -> Result<Vec<(String, u32)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.display_name, COUNT(k.slot)
                 FROM participants p
                 LEFT JOIN picks k ON k.participant_id = p.id AND k.year = ?1
                 GROUP BY p.id
                 ORDER BY p.id",
            )
            .context("failed to prepare pick count query")?;
        let counts = stmt
            .query_map(params![year], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("failed to query pick counts")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick count rows")?;
        Ok(counts)
    }

    // -- Official results ----------------------------------------------------

    /// Record (or overwrite) the official selection at one slot.
    pub fn upsert_official_result(
        &self,
        year: u16,
        slot: u32,
        player_name: Option<&str>,
        team_name: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO official_results (year, slot, player_name, team_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![year, slot, player_name, team_name],
        )
        .context("failed to upsert official result")?;
        Ok(())
    }

    /// The official slot -> player map for `year`. Empty before the draft.
    pub fn load_official_results(&self, year: u16) -> Result<OfficialResults> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT slot, player_name FROM official_results WHERE year = ?1")
            .context("failed to prepare official results query")?;
        let results = stmt
            .query_map(params![year], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("failed to query official results")?
            .collect::<std::result::Result<OfficialResults, _>>()
            .context("failed to map official result rows")?;
        Ok(results)
    }

    // -- Authoritative board -------------------------------------------------

    /// Replace the stored authoritative board for `year` (admin refresh).
    pub fn replace_board(&self, year: u16, records: &[ProspectRecord]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin board transaction")?;
        tx.execute("DELETE FROM board_players WHERE year = ?1", params![year])
            .context("failed to clear board")?;
        for record in records {
            tx.execute(
                "INSERT INTO board_players (year, rank, player_name, school, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![year, record.rank, record.name, record.school, record.position],
            )
            .context("failed to insert board player")?;
        }
        tx.commit().context("failed to commit board")?;
        Ok(())
    }

    /// The stored authoritative board for `year`, ordered by rank. Re-fetched
    /// per call — the admin can refresh it at any time.
    pub fn load_board(&self, year: u16) -> Result<Vec<ProspectRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT rank, player_name, school, position
                 FROM board_players WHERE year = ?1 ORDER BY rank",
            )
            .context("failed to prepare board query")?;
        let records = stmt
            .query_map(params![year], |row| {
                Ok(ProspectRecord {
                    rank: row.get(0)?,
                    name: row.get(1)?,
                    school: row.get(2)?,
                    position: row.get(3)?,
                })
            })
            .context("failed to query board")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map board rows")?;
        Ok(records)
    }

    // -- Draft lock ----------------------------------------------------------

    /// Lock `year`: slates become read-only. Locking an already-locked year
    /// refreshes the timestamp (idempotent for callers).
    pub fn lock_year(&self, year: u16) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO settings (year, locked_at)
             VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
             ON CONFLICT(year) DO UPDATE SET locked_at = excluded.locked_at",
            params![year],
        )
        .context("failed to lock year")?;
        Ok(())
    }

    pub fn is_locked(&self, year: u16) -> Result<bool> {
        let conn = self.conn();
        let locked_at: Option<Option<String>> = conn
            .query_row(
                "SELECT locked_at FROM settings WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query lock state")?;
        Ok(matches!(locked_at, Some(Some(_))))
    }

    // -- Key-value app state -------------------------------------------------

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE so
    /// repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query state")?;
        match json_str {
            Some(json_str) => {
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // -- Simulation snapshots ------------------------------------------------

    /// Persist a simulation snapshot under `key`. Concurrent callers may race
    /// to advance the same run; the write is skipped when the stored snapshot
    /// has already revealed more, so `revealed_count` never moves backward.
    pub fn save_simulation(&self, key: &str, state: &SimulationState) -> Result<()> {
        let conn = self.conn();
        let existing: Option<String> = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read existing simulation state")?;
        if let Some(json_str) = existing {
            if let Ok(stored) = serde_json::from_str::<SimulationState>(&json_str) {
                if stored.active && state.active && stored.revealed_count > state.revealed_count {
                    return Ok(());
                }
            }
        }

        let json_str =
            serde_json::to_string(state).context("failed to serialize simulation state")?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save simulation state")?;
        Ok(())
    }

    /// Load the simulation snapshot under `key`, if one exists.
    pub fn load_simulation(&self, key: &str) -> Result<Option<SimulationState>> {
        match self.load_state(key)? {
            Some(value) => {
                let state = serde_json::from_value(value)
                    .context("failed to deserialize simulation state")?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Remove the simulation snapshot under `key`. Missing keys are fine.
    pub fn clear_simulation(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM app_state WHERE key = ?1", params![key])
            .context("failed to clear simulation state")?;
        Ok(())
    }
}
