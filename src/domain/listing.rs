// src/domain/listing.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// One rentable unit as observed during a crawl.
///
/// Field order matches the snapshot file's column order; `nearest_station`
/// sits last so older snapshots without it still line up.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub address: String,
    pub age: u32,
    pub floor: u32,
    pub rent: f64,
    pub management_fee: f64,
    pub deposit: String,
    pub key_money: String,
    pub layout: String,
    pub area: f64,
    pub walk_minutes: u32,
    pub url: String,
    #[serde(default)]
    pub nearest_station: String,
}

impl Listing {
    /// Monthly cost in yen: rent plus management fee.
    pub fn total_cost(&self) -> f64 {
        self.rent + self.management_fee
    }

    /// Monthly cost in 万円, the unit listings are advertised in.
    pub fn total_cost_man(&self) -> f64 {
        self.total_cost() / 10_000.0
    }
}

/// Valuation verdict attached to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLabel {
    Bargain,
    Standard,
    Expensive,
    InsufficientData,
}

impl ScoreLabel {
    /// Label text as shown to subscribers.
    pub fn display_name(self) -> &'static str {
        match self {
            ScoreLabel::Bargain => "お買い得",
            ScoreLabel::Standard => "標準",
            ScoreLabel::Expensive => "割高",
            ScoreLabel::InsufficientData => "分析中",
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A listing paired with its bargain score.
/// Positive scores mean the listing is cheaper than the model predicts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredListing {
    pub listing: Listing,
    pub score: f64,
    pub label: ScoreLabel,
}

impl ScoredListing {
    pub fn unscored(listing: Listing) -> Self {
        Self {
            listing,
            score: 0.0,
            label: ScoreLabel::InsufficientData,
        }
    }
}
