use serde::{Deserialize, Serialize};

use crate::models::votes::Vote;

const POSITIVE_MIN: i64 = 7;
const NEUTRAL_MIN: i64 = 4;
const NEUTRAL_MAX: i64 = 6;
const NEGATIVE_MAX: i64 = 3;

/// Aggregate rating statistics over the full vote set. Matches the shape
/// the server sends for event-scoped vote queries, so the same struct
/// holds both the client-derived and the server-supplied aggregates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VoteStats {
    #[serde(rename = "averageRating")]
    pub average_rating: String,
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    #[serde(rename = "positiveCount")]
    pub positive_count: u64,
    #[serde(rename = "neutralCount")]
    pub neutral_count: u64,
    #[serde(rename = "negativeCount")]
    pub negative_count: u64,
}

impl Default for VoteStats {
    fn default() -> Self {
        Self {
            average_rating: "0.0".to_owned(),
            total_votes: 0,
            positive_count: 0,
            neutral_count: 0,
            negative_count: 0,
        }
    }
}

impl VoteStats {
    /// Recomputes every field from `votes`. An empty collection is a no-op:
    /// the previous aggregate stays on screen rather than collapsing to
    /// zeros.
    pub fn recompute(&mut self, votes: &[Vote]) {
        if votes.is_empty() {
            return;
        }
        let sum: i64 = votes.iter().map(|vote| vote.rating).sum();
        self.average_rating = format!("{:.1}", sum as f64 / votes.len() as f64);
        self.total_votes = votes.len() as u64;
        self.positive_count = votes
            .iter()
            .filter(|vote| vote.rating >= POSITIVE_MIN)
            .count() as u64;
        self.neutral_count = votes
            .iter()
            .filter(|vote| vote.rating >= NEUTRAL_MIN && vote.rating <= NEUTRAL_MAX)
            .count() as u64;
        self.negative_count = votes
            .iter()
            .filter(|vote| vote.rating <= NEGATIVE_MAX)
            .count() as u64;
    }
}
