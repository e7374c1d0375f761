// Timed reveal simulation.
//
// Before the real event there is nothing to score against, so an operator can
// run a rehearsal: a curated 32-slot order is revealed one slot per interval
// of wall-clock time, and the revealed prefix is served through the same
// official-results map the scorer consumes. The machine itself is pure — it
// is loaded, advanced against an injected clock, and saved on every query, so
// a process restart costs nothing but a reload.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::results::OfficialResults;

/// Default time between reveals (overridable in config).
pub const DEFAULT_REVEAL_INTERVAL_MS: i64 = 30_000;

// ---------------------------------------------------------------------------
// Clock abstraction
// ---------------------------------------------------------------------------

/// Source of wall-clock time, injected so tests never sleep.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// One slot of the reveal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSlot {
    pub player_name: String,
    pub team_name: String,
    pub position: String,
}

/// Persistable reveal-simulation state.
///
/// Idle (inactive) -> Running (`revealed_count` < order length) -> Complete.
/// `revealed_count` only ever grows, driven by elapsed wall-clock intervals;
/// the only operator verbs are start and reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    pub active: bool,
    pub revealed_count: u32,
    pub next_reveal_at_ms: i64,
    /// Interval the run was started with; kept in the snapshot so a config
    /// change mid-run does not skew the catch-up arithmetic.
    pub interval_ms: i64,
    pub ordered_picks: Vec<RevealSlot>,
}

impl SimulationState {
    /// The inactive state: nothing revealed, nothing scheduled.
    pub fn idle() -> Self {
        SimulationState {
            active: false,
            revealed_count: 0,
            next_reveal_at_ms: 0,
            interval_ms: DEFAULT_REVEAL_INTERVAL_MS,
            ordered_picks: Vec::new(),
        }
    }

    /// Start a run over a fixed, curated reveal order (never randomized).
    /// The first reveal lands one interval from `now_ms`.
    pub fn start(order: Vec<RevealSlot>, now_ms: i64, interval_ms: i64) -> Self {
        SimulationState {
            active: true,
            revealed_count: 0,
            next_reveal_at_ms: now_ms + interval_ms,
            interval_ms,
            ordered_picks: order,
        }
    }

    fn total(&self) -> u32 {
        self.ordered_picks.len() as u32
    }

    pub fn is_running(&self) -> bool {
        self.active && self.revealed_count < self.total()
    }

    pub fn is_complete(&self) -> bool {
        self.active && self.revealed_count >= self.total()
    }

    /// Advance to `now_ms`: every interval boundary that has elapsed since
    /// `next_reveal_at_ms` reveals one more slot (catch-up, not drop — five
    /// unobserved intervals apply five reveals at once), capped at the order
    /// length. Idempotent for a fixed `now_ms`; must run before any query,
    /// including the first one after a reload.
    pub fn advance(&mut self, now_ms: i64) {
        if !self.is_running() || self.interval_ms <= 0 {
            return;
        }
        if now_ms < self.next_reveal_at_ms {
            return;
        }

        let boundaries = (now_ms - self.next_reveal_at_ms) / self.interval_ms + 1;
        let remaining = i64::from(self.total() - self.revealed_count);
        let steps = boundaries.min(remaining);

        self.revealed_count += steps as u32;
        self.next_reveal_at_ms += steps * self.interval_ms;
    }

    /// The revealed prefix of the order.
    pub fn revealed_picks(&self) -> &[RevealSlot] {
        &self.ordered_picks[..self.revealed_count as usize]
    }

    /// The revealed prefix as the slot -> player map the scorer consumes, so
    /// simulated and real results share one scoring path.
    pub fn revealed_results(&self) -> OfficialResults {
        self.revealed_picks()
            .iter()
            .enumerate()
            .map(|(i, slot)| (i as u32 + 1, Some(slot.player_name.clone())))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Reveal order loading
// ---------------------------------------------------------------------------

/// Raw reveal-order CSV row. Header: player,team,position.
#[derive(Debug, Deserialize)]
struct RawRevealRow {
    player: String,
    team: String,
    position: String,
}

/// Load the curated reveal order from a CSV file. The file is authored by
/// hand, so a malformed row is an error rather than a skip.
pub fn load_reveal_order(path: &std::path::Path) -> Result<Vec<RevealSlot>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open reveal order {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut order = Vec::new();
    for result in reader.deserialize::<RawRevealRow>() {
        let raw = result
            .with_context(|| format!("malformed reveal order row in {}", path.display()))?;
        order.push(RevealSlot {
            player_name: raw.player.trim().to_string(),
            team_name: raw.team.trim().to_string(),
            position: raw.position.trim().to_string(),
        });
    }
    if order.is_empty() {
        anyhow::bail!("reveal order {} contains no rows", path.display());
    }
    Ok(order)
}

// ---------------------------------------------------------------------------
// Persistence driver
// ---------------------------------------------------------------------------

/// Load the simulation for `key`, advance it to the clock's now, and persist
/// the advanced state. Returns the idle state when no run exists.
pub fn current_simulation(
    db: &Database,
    key: &str,
    clock: &dyn Clock,
) -> Result<SimulationState> {
    let Some(mut state) = db.load_simulation(key)? else {
        return Ok(SimulationState::idle());
    };
    let before = state.revealed_count;
    state.advance(clock.now_ms());
    if state.revealed_count != before {
        info!(
            "simulation {key}: revealed {} -> {}",
            before, state.revealed_count
        );
        db.save_simulation(key, &state)
            .context("failed to persist advanced simulation state")?;
    }
    Ok(state)
}

/// Start a run for `key` unless one is already active (idempotent — starting
/// a running simulation is a no-op and returns the current state).
pub fn start_simulation(
    db: &Database,
    key: &str,
    order: Vec<RevealSlot>,
    clock: &dyn Clock,
    interval_ms: i64,
) -> Result<SimulationState> {
    if let Some(existing) = db.load_simulation(key)? {
        if existing.active {
            info!("simulation {key}: already running, start ignored");
            return current_simulation(db, key, clock);
        }
    }
    let state = SimulationState::start(order, clock.now_ms(), interval_ms);
    db.save_simulation(key, &state)
        .context("failed to persist new simulation state")?;
    info!(
        "simulation {key}: started, {} slots, one reveal per {}ms",
        state.ordered_picks.len(),
        interval_ms
    );
    Ok(state)
}

/// Discard the run for `key`. Resetting a simulation that does not exist is a
/// no-op, not an error.
pub fn reset_simulation(db: &Database, key: &str) -> Result<()> {
    db.clear_simulation(key)
        .context("failed to clear simulation state")?;
    info!("simulation {key}: reset");
    Ok(())
}
