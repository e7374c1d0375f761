// Mockboard entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, env-filtered)
// 2. Load config
// 3. Open database
// 4. Dispatch the subcommand

use mockboard::board::leaderboard::{build_leaderboard, submission_status};
use mockboard::board::pick::{is_complete, Pick, TOTAL_SLOTS};
use mockboard::config::{self, Config};
use mockboard::db::Database;
use mockboard::rankings::fusion::{average_position_consensus, rrf_consensus, ConsensusEntry};
use mockboard::rankings::identity::CanonicalNameMap;
use mockboard::rankings::sources::{self, ProspectRecord, SourceBoard};
use mockboard::results::{sync_official_results, EspnFeed};
use mockboard::sim::{self, SystemClock};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: year {}, {} comparison sources",
        config.year,
        config.comparison_sources.len()
    );

    let db = Database::open(&config.db_path).context("failed to open database")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg_strs: Vec<&str> = args.iter().map(String::as_str).collect();

    match arg_strs.as_slice() {
        ["board"] => cmd_board(&db, &config, None),
        ["board", source] => cmd_board(&db, &config, Some(source)),
        ["consensus", "rrf"] => cmd_consensus(&db, &config, true),
        ["consensus", "avg"] => cmd_consensus(&db, &config, false),
        ["enter", handle, name] => cmd_enter(&db, handle, name),
        ["slate", handle, path] => cmd_slate(&db, &config, handle, path),
        ["status"] => cmd_status(&db, &config),
        ["submissions"] => cmd_submissions(&db, &config),
        ["leaderboard"] => cmd_leaderboard(&db, &config, false),
        ["leaderboard", "--sim"] => cmd_leaderboard(&db, &config, true),
        ["lock"] => cmd_lock(&db, &config),
        ["refresh-board"] => cmd_refresh_board(&db, &config),
        ["sync"] => cmd_sync(&db, &config).await,
        ["sim", "start"] => cmd_sim_start(&db, &config),
        ["sim", "status"] => cmd_sim_status(&db, &config),
        ["sim", "reset"] => cmd_sim_reset(&db, &config),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!(
        "mockboard — friend-group mock draft prediction game

USAGE:
  mockboard board [SOURCE]       print the primary board, or a comparison source's
  mockboard consensus <rrf|avg>  print a fused consensus ranking
  mockboard enter HANDLE NAME    register a participant
  mockboard slate HANDLE FILE    import a participant's slate from CSV
  mockboard status               submission progress for all participants
  mockboard submissions          print complete slates
  mockboard leaderboard [--sim]  standings against official (or simulated) results
  mockboard lock                 lock the year; slates become read-only
  mockboard refresh-board        reload the primary board CSV into the database
  mockboard sync                 pull live official results from the feed
  mockboard sim start            start the timed reveal simulation
  mockboard sim status           advance and show the simulation
  mockboard sim reset            discard the simulation"
    );
}

/// Initialize tracing to stderr so stdout stays clean for command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mockboard=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Board loading helpers
// ---------------------------------------------------------------------------

/// The authoritative board: the database copy when one has been seeded
/// (admin-refreshable), otherwise the shipped CSV.
fn load_primary(db: &Database, config: &Config) -> anyhow::Result<Vec<ProspectRecord>> {
    let stored = db.load_board(config.year)?;
    if !stored.is_empty() {
        return Ok(stored);
    }
    info!("no board in database for {}; reading primary CSV", config.year);
    sources::load_board(&config.primary_board_path).context("failed to load primary board")
}

/// All configured comparison boards, extended with the primary's tail. A
/// source whose file is missing or unreadable is skipped with a warning
/// rather than failing the whole command.
fn load_comparisons(config: &Config, primary: &[ProspectRecord]) -> Vec<SourceBoard> {
    let canonical = CanonicalNameMap::build(primary);
    let mut boards = Vec::with_capacity(config.comparison_sources.len());
    for source in &config.comparison_sources {
        match sources::load_board(&source.path) {
            Ok(records) => boards.push(SourceBoard {
                id: source.id.clone(),
                records: sources::extend_with_primary(records, primary, &canonical),
            }),
            Err(e) => warn!("skipping comparison source `{}`: {}", source.id, e),
        }
    }
    boards
}

fn print_board(records: &[ProspectRecord]) {
    for r in records {
        println!("{:>3}  {:<28} {:<22} {}", r.rank, r.name, r.school, r.position);
    }
}

fn print_consensus(entries: &[ConsensusEntry]) {
    for e in entries {
        println!("{:>3}  {:<28} {:<22} {}", e.rank, e.name, e.school, e.position);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_board(db: &Database, config: &Config, source: Option<&str>) -> anyhow::Result<()> {
    let primary = load_primary(db, config)?;
    match source {
        None => print_board(&primary),
        Some(id) => {
            let board = load_comparisons(config, &primary)
                .into_iter()
                .find(|b| b.id == id)
                .with_context(|| format!("unknown or unreadable source `{id}`"))?;
            print_board(&board.records);
        }
    }
    Ok(())
}

fn cmd_consensus(db: &Database, config: &Config, rrf: bool) -> anyhow::Result<()> {
    let primary = load_primary(db, config)?;
    let comparisons = load_comparisons(config, &primary);
    let entries = if rrf {
        rrf_consensus(&primary, &comparisons, config.rrf_k)
    } else {
        average_position_consensus(&primary, &comparisons)
    };
    print_consensus(&entries);
    Ok(())
}

fn cmd_enter(db: &Database, handle: &str, name: &str) -> anyhow::Result<()> {
    let id = db.upsert_participant(handle, name)?;
    println!("registered {name} ({handle}) as participant #{id}");
    Ok(())
}

/// Raw slate CSV row. Header: slot,player,position,double_score.
#[derive(Debug, Deserialize)]
struct RawSlateRow {
    slot: u32,
    player: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    double_score: bool,
}

fn slate_from_csv(path: &str) -> anyhow::Result<Vec<Pick>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open slate file {path}"))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut picks = Vec::new();
    for result in reader.deserialize::<RawSlateRow>() {
        let raw = result.with_context(|| format!("malformed slate row in {path}"))?;
        let position = if raw.position.trim().is_empty() {
            None
        } else {
            Some(raw.position.trim().to_string())
        };
        picks.push(Pick {
            slot: raw.slot,
            player_name: Some(raw.player.trim().to_string()),
            position,
            double_score: raw.double_score,
        });
    }
    Ok(picks)
}

fn cmd_slate(db: &Database, config: &Config, handle: &str, path: &str) -> anyhow::Result<()> {
    let Some(participant) = db.find_participant(handle)? else {
        bail!("unknown participant `{handle}`; register with `mockboard enter`");
    };
    let picks = slate_from_csv(path)?;
    db.save_slate(participant.id, config.year, picks)?;

    let stored = db.load_slate(participant.id, config.year)?;
    let filled = stored.len();
    println!(
        "saved {filled}/{TOTAL_SLOTS} picks for {} ({})",
        participant.display_name,
        if is_complete(&stored) { "complete" } else { "incomplete" }
    );
    Ok(())
}

fn cmd_status(db: &Database, config: &Config) -> anyhow::Result<()> {
    let counts = db.pick_counts(config.year)?;
    if counts.is_empty() {
        println!("no participants registered");
        return Ok(());
    }
    for status in submission_status(&counts) {
        let mark = if status.complete { "✓" } else { " " };
        println!("{mark} {:<24} {:>2}/{TOTAL_SLOTS}", status.participant, status.filled);
    }
    Ok(())
}

fn cmd_submissions(db: &Database, config: &Config) -> anyhow::Result<()> {
    let order = sources::load_draft_order(&config.draft_order_path)
        .context("failed to load draft order")?;
    let slates = db.load_all_slates(config.year)?;
    let mut any = false;
    for (participant, picks) in slates {
        if !is_complete(&picks) {
            continue;
        }
        any = true;
        println!("== {participant}");
        for pick in &picks {
            let team = order.get(&pick.slot).map(String::as_str).unwrap_or("-");
            let player = pick.player_name.as_deref().unwrap_or("-");
            let flag = if pick.double_score { "  (x2)" } else { "" };
            println!("{:>3}  {:<24} {player}{flag}", pick.slot, team);
        }
    }
    if !any {
        println!("no complete slates yet");
    }
    Ok(())
}

fn cmd_leaderboard(db: &Database, config: &Config, simulated: bool) -> anyhow::Result<()> {
    let official = if simulated {
        let state = sim::current_simulation(db, &sim_key(config), &SystemClock)?;
        if !state.active {
            println!("no simulation running; start one with `mockboard sim start`");
            return Ok(());
        }
        state.revealed_results()
    } else {
        db.load_official_results(config.year)?
    };

    let slates = db.load_all_slates(config.year)?;
    let standings = build_leaderboard(&slates, &official);
    if standings.is_empty() {
        println!("no complete slates to rank");
        return Ok(());
    }
    for (i, standing) in standings.iter().enumerate() {
        println!("{:>3}. {:<24} {:>4}", i + 1, standing.participant, standing.score);
    }
    Ok(())
}

fn cmd_lock(db: &Database, config: &Config) -> anyhow::Result<()> {
    db.lock_year(config.year)?;
    println!("draft {} locked; slates are now read-only", config.year);
    Ok(())
}

fn cmd_refresh_board(db: &Database, config: &Config) -> anyhow::Result<()> {
    let records = sources::load_board(&config.primary_board_path)
        .context("failed to load primary board CSV")?;
    db.replace_board(config.year, &records)?;
    println!("refreshed {} board players for {}", records.len(), config.year);
    Ok(())
}

async fn cmd_sync(db: &Database, config: &Config) -> anyhow::Result<()> {
    let feed = EspnFeed::new(config.feed_url.clone())?;
    let synced = sync_official_results(db, &feed, config.year).await?;
    if synced == 0 {
        println!("no official picks available yet");
    } else {
        println!("synced {synced} official picks for {}", config.year);
    }
    Ok(())
}

fn sim_key(config: &Config) -> String {
    format!("sim:{}", config.year)
}

fn cmd_sim_start(db: &Database, config: &Config) -> anyhow::Result<()> {
    let order = sim::load_reveal_order(&config.sim_order_path)?;
    let state = sim::start_simulation(
        db,
        &sim_key(config),
        order,
        &SystemClock,
        config.reveal_interval_ms,
    )?;
    println!(
        "simulation running: {} slots, one reveal every {}s",
        state.ordered_picks.len(),
        config.reveal_interval_ms / 1_000
    );
    Ok(())
}

fn cmd_sim_status(db: &Database, config: &Config) -> anyhow::Result<()> {
    let state = sim::current_simulation(db, &sim_key(config), &SystemClock)?;
    if !state.active {
        println!("simulation inactive");
        return Ok(());
    }

    println!(
        "revealed {}/{} picks{}",
        state.revealed_count,
        state.ordered_picks.len(),
        if state.is_complete() { " — complete" } else { "" }
    );
    for (i, slot) in state.revealed_picks().iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:<24} {}",
            i + 1,
            slot.team_name,
            slot.player_name,
            slot.position
        );
    }

    let slates = db.load_all_slates(config.year)?;
    let standings = build_leaderboard(&slates, &state.revealed_results());
    if !standings.is_empty() {
        println!("-- standings so far --");
        for (i, standing) in standings.iter().enumerate() {
            println!("{:>3}. {:<24} {:>4}", i + 1, standing.participant, standing.score);
        }
    }
    Ok(())
}

fn cmd_sim_reset(db: &Database, config: &Config) -> anyhow::Result<()> {
    sim::reset_simulation(db, &sim_key(config))?;
    println!("simulation reset");
    Ok(())
}
