use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use crate::api::ApiEnvelope;
use crate::models::votes::Vote;
use crate::session::{authorized_request_json, ApiError, SessionStore};
use crate::stats::VoteStats;

/// Votes scoped to one event. The server may attach its own aggregate,
/// which takes precedence over the client-derived one for that view.
#[derive(Debug)]
pub struct EventVotes {
    pub votes: Vec<Vote>,
    pub stats: Option<VoteStats>,
}

#[derive(Deserialize, Debug)]
struct EventVotesEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Vec<Vote>>,
    #[serde(default)]
    stats: Option<VoteStats>,
    #[serde(default)]
    message: Option<String>,
}

pub async fn fetch_all_votes(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
) -> Result<Vec<Vote>, ApiError> {
    debug!("Fetching all votes");
    let request = client.get(format!("{base_url}/admin/votes")).build()?;
    let envelope: ApiEnvelope<Vec<Vote>> =
        authorized_request_json(client, session, request).await?;
    envelope.into_data()
}

pub async fn fetch_event_votes(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    event_id: &str,
) -> Result<EventVotes, ApiError> {
    debug!("Fetching votes for event {event_id}");
    let request = client
        .get(format!("{base_url}/admin/votes/event/{event_id}"))
        .build()?;
    let envelope: EventVotesEnvelope =
        authorized_request_json(client, session, request).await?;
    if !envelope.success {
        return Err(ApiError::Api(
            envelope
                .message
                .unwrap_or_else(|| "Request failed".to_owned()),
        ));
    }
    Ok(EventVotes {
        votes: envelope.data.unwrap_or_default(),
        stats: envelope.stats,
    })
}

pub async fn delete_vote(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    vote_id: &str,
) -> Result<(), ApiError> {
    debug!("Deleting vote {vote_id}");
    let request = client
        .delete(format!("{base_url}/admin/votes/{vote_id}"))
        .build()?;
    let envelope: ApiEnvelope<serde_json::Value> =
        authorized_request_json(client, session, request).await?;
    envelope.ok()?;
    info!("Vote {vote_id} deleted");
    Ok(())
}
