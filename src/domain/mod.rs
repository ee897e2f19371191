pub mod changes;
pub mod listing;
pub mod parsers;

pub use changes::{diff_new, merge};
pub use listing::{Listing, ScoreLabel, ScoredListing};
