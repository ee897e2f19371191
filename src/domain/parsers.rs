// src/domain/parsers.rs
//
// Text-to-value converters for the fields of a listing row.
// Every parser maps empty or placeholder ("-") input to zero and fails
// explicitly on anything else it cannot read. Zero-filling on failure is
// the caller's decision.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} format: {raw:?}")]
pub struct ParseError {
    pub field: &'static str,
    pub raw: String,
}

impl ParseError {
    fn new(field: &'static str, raw: &str) -> Self {
        Self {
            field,
            raw: raw.to_string(),
        }
    }
}

// "7.9万円", "10万円", "7.9万"
static RENT_MAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9.]+)\s*万円?").unwrap());
// "5000円", "10,000円"
static RENT_YEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9,]+)\s*円$").unwrap());
static AREA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9.]+)").unwrap());
static AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"築([0-9]+)年").unwrap());
// "歩8分", "徒歩8分", "8分"
static WALK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:徒歩|歩)?([0-9]+)分").unwrap());
// "3階", "3-4階"; "B1階" does not match
static FLOOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)(?:-[0-9]+)?階").unwrap());
static LISTING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"jnc_[0-9]+").unwrap());

const NEW_CONSTRUCTION: &str = "新築";

fn is_blank(s: &str) -> bool {
    s.is_empty() || s == "-"
}

/// Rent or fee in yen. Accepts the 万 multiplier form or plain yen.
pub fn parse_rent(raw: &str) -> Result<f64, ParseError> {
    let s = raw.trim();
    if is_blank(s) {
        return Ok(0.0);
    }

    if let Some(caps) = RENT_MAN.captures(s) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| ParseError::new("rent", raw))?;
        return Ok(value * 10_000.0);
    }

    if let Some(caps) = RENT_YEN.captures(s) {
        let digits = caps[1].replace(',', "");
        return digits.parse().map_err(|_| ParseError::new("rent", raw));
    }

    Err(ParseError::new("rent", raw))
}

/// Floor area in m². The unit suffix is stripped, not checked.
pub fn parse_area(raw: &str) -> Result<f64, ParseError> {
    let s = raw.trim();
    if is_blank(s) {
        return Ok(0.0);
    }

    let caps = AREA.captures(s).ok_or_else(|| ParseError::new("area", raw))?;
    caps[1].parse().map_err(|_| ParseError::new("area", raw))
}

/// Building age in years; 新築 (new construction) is zero.
pub fn parse_age(raw: &str) -> Result<u32, ParseError> {
    let s = raw.trim();
    if is_blank(s) || s.contains(NEW_CONSTRUCTION) {
        return Ok(0);
    }

    let caps = AGE.captures(s).ok_or_else(|| ParseError::new("age", raw))?;
    caps[1].parse().map_err(|_| ParseError::new("age", raw))
}

/// Walking minutes to the station, searched anywhere in an access line
/// such as "西武新宿線/新井薬師前駅 歩8分".
pub fn parse_walk_minutes(raw: &str) -> Result<u32, ParseError> {
    let s = raw.trim();
    if is_blank(s) {
        return Ok(0);
    }

    let caps = WALK
        .captures(s)
        .ok_or_else(|| ParseError::new("walk_minutes", raw))?;
    caps[1]
        .parse()
        .map_err(|_| ParseError::new("walk_minutes", raw))
}

/// Floor number. Ranges yield their first floor; basement floors are rejected.
pub fn parse_floor(raw: &str) -> Result<u32, ParseError> {
    let s = raw.trim();
    if is_blank(s) {
        return Ok(0);
    }

    let caps = FLOOR.captures(s).ok_or_else(|| ParseError::new("floor", raw))?;
    caps[1].parse().map_err(|_| ParseError::new("floor", raw))
}

/// Station name from an access line: the segment after the last `/`
/// up to the first whitespace. Returns an empty string when absent.
pub fn parse_station(raw: &str) -> String {
    let s = raw.trim();
    if is_blank(s) {
        return String::new();
    }

    let after_line = s.rsplit('/').next().unwrap_or(s);
    after_line
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Listing identifier embedded in a detail link,
/// e.g. "/chintai/jnc_000102396492/" -> "jnc_000102396492".
pub fn extract_listing_id(link: &str) -> String {
    LISTING_ID
        .find(link)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
