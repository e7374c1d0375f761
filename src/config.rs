// Configuration loading and parsing (config/mockboard.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Raw file structure
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire mockboard.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    game: GameSection,
    database: DatabaseSection,
    consensus: ConsensusSection,
    simulation: SimulationSection,
    results_feed: ResultsFeedSection,
    boards: BoardsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct GameSection {
    year: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ConsensusSection {
    rrf_k: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct SimulationSection {
    reveal_interval_secs: u32,
    order_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultsFeedSection {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BoardsSection {
    primary_path: PathBuf,
    draft_order_path: PathBuf,
    #[serde(default)]
    comparison: Vec<ComparisonSource>,
}

/// One comparison ranking source: a short id and the path of its board CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonSource {
    pub id: String,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Draft year the game is running against.
    pub year: u16,
    pub db_path: String,
    /// Damping constant for reciprocal rank fusion.
    pub rrf_k: u32,
    /// Time between simulated reveals.
    pub reveal_interval_ms: i64,
    pub sim_order_path: PathBuf,
    /// Live results endpoint; `{year}` is substituted at fetch time.
    pub feed_url: String,
    pub primary_board_path: PathBuf,
    pub draft_order_path: PathBuf,
    pub comparison_sources: Vec<ComparisonSource>,
}

/// Load and validate configuration from `config/mockboard.toml` relative to
/// the given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("mockboard.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        year: file.game.year,
        db_path: file.database.path,
        rrf_k: file.consensus.rrf_k,
        reveal_interval_ms: i64::from(file.simulation.reveal_interval_secs) * 1_000,
        sim_order_path: file.simulation.order_path,
        feed_url: file.results_feed.url,
        primary_board_path: file.boards.primary_path,
        draft_order_path: file.boards.draft_order_path,
        comparison_sources: file.boards.comparison,
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from the current directory's `config/` folder.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("."))
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !(2020..=2040).contains(&config.year) {
        return Err(ConfigError::ValidationError {
            field: "game.year".to_string(),
            message: format!("year {} outside supported range 2020-2040", config.year),
        });
    }
    if config.rrf_k == 0 {
        return Err(ConfigError::ValidationError {
            field: "consensus.rrf_k".to_string(),
            message: "RRF constant must be positive".to_string(),
        });
    }
    if config.reveal_interval_ms <= 0 {
        return Err(ConfigError::ValidationError {
            field: "simulation.reveal_interval_secs".to_string(),
            message: "reveal interval must be positive".to_string(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    for source in &config.comparison_sources {
        if source.id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "boards.comparison.id".to_string(),
                message: "comparison source id must not be empty".to_string(),
            });
        }
        if !seen.insert(source.id.clone()) {
            return Err(ConfigError::ValidationError {
                field: "boards.comparison.id".to_string(),
                message: format!("duplicate comparison source id `{}`", source.id),
            });
        }
    }
    Ok(())
}
