use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "voteCount", default)]
    pub vote_count: u64,
    #[serde(rename = "lastVote", default)]
    pub last_vote: Option<String>,
}
