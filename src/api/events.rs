use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::api::ApiEnvelope;
use crate::models::events::Event;
use crate::session::{authorized_request_json, ApiError, SessionStore};

#[derive(Serialize, Debug)]
struct CreateEventRequest<'a> {
    #[serde(rename = "eventName")]
    event_name: &'a str,
}

pub async fn fetch_events(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
) -> Result<Vec<Event>, ApiError> {
    debug!("Fetching events");
    let request = client.get(format!("{base_url}/admin/events")).build()?;
    let envelope: ApiEnvelope<Vec<Event>> =
        authorized_request_json(client, session, request).await?;
    envelope.into_data()
}

pub async fn create_event(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    name: &str,
) -> Result<(), ApiError> {
    debug!("Creating event {name:?}");
    let request = client
        .post(format!("{base_url}/admin/events"))
        .json(&CreateEventRequest { event_name: name })
        .build()?;
    let envelope: ApiEnvelope<serde_json::Value> =
        authorized_request_json(client, session, request).await?;
    envelope.ok()?;
    info!("Event {name:?} created");
    Ok(())
}

/// Deletes an event and, server-side, every vote referencing it. The event
/// name is user text and addresses the resource, so it goes out as a
/// percent-encoded path segment.
pub async fn delete_event(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    name: &str,
) -> Result<(), ApiError> {
    debug!("Deleting event {name:?}");
    let mut url = Url::parse(base_url)
        .map_err(|e| ApiError::Validation(format!("invalid server address: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Validation("invalid server address".to_owned()))?
        .extend(["admin", "events", name]);
    let request = client.delete(url).build()?;
    let envelope: ApiEnvelope<serde_json::Value> =
        authorized_request_json(client, session, request).await?;
    envelope.ok()?;
    info!("Event {name:?} deleted");
    Ok(())
}
