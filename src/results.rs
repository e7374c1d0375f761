// Official first-round results, real or synced from a live feed.
//
// The feed is a fallible outside collaborator: a failed or empty fetch means
// "no results yet", never an error that aborts scoring.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::Database;

/// Slot number -> player who actually went there (`None` while unannounced).
/// This one map shape is consumed by the scorer whether it came from admin
/// entry, the live feed, or the reveal simulator.
pub type OfficialResults = BTreeMap<u32, Option<String>>;

/// One first-round selection reported by a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPick {
    pub slot: u32,
    pub player_name: Option<String>,
    pub team_name: Option<String>,
}

/// A live draft results provider.
#[async_trait]
pub trait ResultsFeed {
    /// Fetch the first-round picks announced so far for `year`.
    async fn fetch_first_round(&self, year: u16) -> Result<Vec<FeedPick>>;
}

// ---------------------------------------------------------------------------
// ESPN feed
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    round: Option<u32>,
    pick: Option<u32>,
    athlete: Option<FeedAthlete>,
    team: Option<FeedTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedAthlete {
    display_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedTeam {
    display_name: Option<String>,
}

/// Pulls first-round picks from ESPN's public draft endpoint.
pub struct EspnFeed {
    http: reqwest::Client,
    /// URL template containing a `{year}` placeholder.
    url_template: String,
}

impl EspnFeed {
    pub fn new(url_template: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(EspnFeed { http, url_template })
    }
}

#[async_trait]
impl ResultsFeed for EspnFeed {
    async fn fetch_first_round(&self, year: u16) -> Result<Vec<FeedPick>> {
        let url = self.url_template.replace("{year}", &year.to_string());
        let response: FeedResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("results feed request failed")?
            .error_for_status()
            .context("results feed returned an error status")?
            .json()
            .await
            .context("results feed returned malformed JSON")?;

        Ok(parse_feed_items(response.items))
    }
}

/// Keep round-1 items (items with no round field are assumed first-round)
/// with a slot in range; prefer the athlete's display name over the short
/// name, as the feed sometimes omits one.
fn parse_feed_items(items: Vec<FeedItem>) -> Vec<FeedPick> {
    items
        .into_iter()
        .filter(|item| matches!(item.round, Some(1) | None))
        .filter_map(|item| {
            let slot = item.pick?;
            if slot < 1 || slot > crate::board::pick::TOTAL_SLOTS {
                return None;
            }
            let player_name = item
                .athlete
                .and_then(|a| a.display_name.or(a.short_name));
            let team_name = item.team.and_then(|t| t.display_name);
            Some(FeedPick {
                slot,
                player_name,
                team_name,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Store synchronization
// ---------------------------------------------------------------------------

/// Pull the live feed and upsert what it reports into the official results
/// for `year`. A feed failure degrades to zero picks synced (scoring simply
/// proceeds with whatever the store already holds); only a store failure is
/// an error.
pub async fn sync_official_results(
    db: &Database,
    feed: &dyn ResultsFeed,
    year: u16,
) -> Result<usize> {
    let picks = match feed.fetch_first_round(year).await {
        Ok(picks) => picks,
        Err(e) => {
            warn!("live results fetch failed, treating as no data: {e:#}");
            return Ok(0);
        }
    };

    let mut synced = 0;
    for pick in &picks {
        db.upsert_official_result(
            year,
            pick.slot,
            pick.player_name.as_deref(),
            pick.team_name.as_deref(),
        )?;
        synced += 1;
    }
    if synced > 0 {
        info!("synced {synced} official picks for {year}");
    }
    Ok(synced)
}
