// src/valuation/regression.rs
//
// Ordinary least squares of total monthly cost on area, age, floor and
// walking minutes, plus a drop-first dummy per nearest station.

use crate::config::ValuationConfig;
use crate::domain::{Listing, ScoreLabel, ScoredListing};
use nalgebra::{DMatrix, DVector};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

/// Intercept plus the four numeric predictors.
const NUMERIC_COLUMNS: usize = 5;

/// Smallest singular value of XᵗX, relative to the largest, still treated as full rank.
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegressionError {
    #[error("no listings to fit")]
    Empty,

    #[error("normal equations are singular")]
    Singular,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    pub intercept: f64,
    pub area: f64,
    pub age: f64,
    pub floor: f64,
    pub walk_minutes: f64,
    /// Dummy coefficient per station, excluding the reference station.
    pub station_effects: BTreeMap<String, f64>,
    /// Lexicographically smallest station; absorbed into the intercept.
    pub reference_station: Option<String>,
}

/// Near-singular counts as singular: the smallest singular value must stay
/// above `SINGULAR_TOLERANCE` times the largest.
fn is_rank_deficient(xtx: &DMatrix<f64>) -> bool {
    let singular = xtx.clone().svd(false, false).singular_values;
    singular.min() <= singular.max() * SINGULAR_TOLERANCE
}

fn numeric_features(listing: &Listing) -> [f64; NUMERIC_COLUMNS - 1] {
    [
        listing.area,
        listing.age as f64,
        listing.floor as f64,
        listing.walk_minutes as f64,
    ]
}

/// Fits the model over `listings` via the normal equations.
pub fn fit(listings: &[Listing]) -> Result<RegressionModel, RegressionError> {
    if listings.is_empty() {
        return Err(RegressionError::Empty);
    }

    let stations: BTreeSet<&str> = listings
        .iter()
        .map(|l| l.nearest_station.as_str())
        .collect();
    let mut stations = stations.into_iter();
    let reference_station = stations.next().map(str::to_string);
    let dummy_stations: Vec<&str> = stations.collect();

    let cols = NUMERIC_COLUMNS + dummy_stations.len();
    let mut rows = Vec::with_capacity(listings.len() * cols);
    for l in listings {
        rows.push(1.0);
        rows.extend(numeric_features(l));
        rows.extend(
            dummy_stations
                .iter()
                .map(|s| if *s == l.nearest_station { 1.0 } else { 0.0 }),
        );
    }
    let design = DMatrix::from_row_slice(listings.len(), cols, &rows);
    let y = DVector::from_iterator(listings.len(), listings.iter().map(Listing::total_cost));

    let xtx = design.tr_mul(&design);
    if is_rank_deficient(&xtx) {
        return Err(RegressionError::Singular);
    }
    let xtx_inv = xtx.try_inverse().ok_or(RegressionError::Singular)?;
    let beta = xtx_inv * design.tr_mul(&y);

    let station_effects = dummy_stations
        .iter()
        .zip(beta.iter().skip(NUMERIC_COLUMNS))
        .map(|(s, b)| (s.to_string(), *b))
        .collect();

    Ok(RegressionModel {
        intercept: beta[0],
        area: beta[1],
        age: beta[2],
        floor: beta[3],
        walk_minutes: beta[4],
        station_effects,
        reference_station,
    })
}

impl RegressionModel {
    /// Predicted total monthly cost. Stations the model has not seen
    /// (and the reference station) contribute nothing.
    pub fn predict(&self, listing: &Listing) -> f64 {
        let [area, age, floor, walk] = numeric_features(listing);
        let station = self
            .station_effects
            .get(&listing.nearest_station)
            .copied()
            .unwrap_or(0.0);

        self.intercept
            + self.area * area
            + self.age * age
            + self.floor * floor
            + self.walk_minutes * walk
            + station
    }

    /// Predicted minus actual cost; positive means cheaper than expected.
    pub fn score(&self, listing: &Listing) -> f64 {
        self.predict(listing) - listing.total_cost()
    }
}

/// Bargain at or above `+threshold`, expensive at or below `-threshold`.
pub fn classify(score: f64, threshold: f64) -> ScoreLabel {
    if score >= threshold {
        ScoreLabel::Bargain
    } else if score <= -threshold {
        ScoreLabel::Expensive
    } else {
        ScoreLabel::Standard
    }
}

pub struct Analyzer {
    config: ValuationConfig,
}

impl Analyzer {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, score: f64) -> ScoreLabel {
        classify(score, self.config.bargain_threshold)
    }

    /// Scores `subjects` against a model fit on `collection`.
    ///
    /// With fewer than `min_samples` listings, or when the fit is singular,
    /// every subject comes back unscored.
    pub fn analyze(&self, collection: &[Listing], subjects: &[Listing]) -> Vec<ScoredListing> {
        if collection.len() < self.config.min_samples {
            info!(
                samples = collection.len(),
                min_samples = self.config.min_samples,
                "not enough listings for regression"
            );
            return subjects.iter().cloned().map(ScoredListing::unscored).collect();
        }

        let model = match fit(collection) {
            Ok(model) => model,
            Err(e) => {
                info!(samples = collection.len(), error = %e, "regression failed");
                return subjects.iter().cloned().map(ScoredListing::unscored).collect();
            }
        };
        debug!(?model, "fitted rent model");

        subjects
            .iter()
            .map(|listing| {
                let score = model.score(listing);
                ScoredListing {
                    listing: listing.clone(),
                    score,
                    label: self.classify(score),
                }
            })
            .collect()
    }
}
