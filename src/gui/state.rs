use log::error;
use reqwest::Client;

use crate::api;
use crate::api::votes::EventVotes;
use crate::models::auth::AdminUser;
use crate::models::events::Event;
use crate::models::votes::Vote;
use crate::session::{ApiError, SessionStore};
use crate::stats::VoteStats;
use crate::{APP_STATE, SESSION};

const DEFAULT_SERVER: &str = "https://hermanbackend.onrender.com";

/// A destructive action waiting for the operator to confirm it in the
/// dialog. Deletions never run straight from their row button.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteEvent { name: String },
    DeleteVote { id: String },
}

pub struct AppState {
    pub server_address: String,
    pub email: String,
    pub password: String,
    pub login_error: String,
    pub logging_in: bool,
    pub authenticated: bool,
    pub user: Option<AdminUser>,

    pub events: Vec<Event>,
    pub all_votes: Vec<Vote>,
    pub votes: Vec<Vote>,
    pub selected_event: Option<Event>,
    pub stats: VoteStats,

    pub loading_events: bool,
    pub loading_votes: bool,
    pub creating: bool,
    pub create_modal_open: bool,
    pub new_event_name: String,
    pub create_error: String,
    pub pending_confirm: Option<ConfirmAction>,
    pub status_message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            server_address: DEFAULT_SERVER.to_owned(),
            email: String::new(),
            password: String::new(),
            login_error: String::new(),
            logging_in: false,
            authenticated: false,
            user: None,
            events: Vec::new(),
            all_votes: Vec::new(),
            votes: Vec::new(),
            selected_event: None,
            stats: VoteStats::default(),
            loading_events: false,
            loading_votes: false,
            creating: false,
            create_modal_open: false,
            new_event_name: String::new(),
            create_error: String::new(),
            pending_confirm: None,
            status_message: "Not signed in".to_owned(),
        }
    }

    fn base_url(&self) -> String {
        self.server_address.trim().trim_end_matches('/').to_owned()
    }

    /// Prefills the login form from the persisted profile and, when the
    /// durable token survived a restart, goes straight to the polls screen.
    /// A stale token bounces back here through the 401 path.
    pub fn restore_profile(&mut self) {
        if let Some(user) = SESSION.load_profile() {
            self.email = user.email.clone();
            self.user = Some(user);
        }
        if SESSION.current_token().is_some() {
            self.authenticated = true;
            self.status_message = "Restored session".to_owned();
            self.load_initial();
        }
    }

    pub fn login(&mut self) {
        let email = self.email.trim().to_owned();
        let password = self.password.clone();
        if email.is_empty() || password.is_empty() {
            self.login_error = "Please fill in both fields".to_owned();
            return;
        }
        self.logging_in = true;
        self.login_error.clear();
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result =
                rt.block_on(api::auth::login(&client, &SESSION, &base_url, &email, &password));

            {
                let mut state = APP_STATE.lock().unwrap();
                state.logging_in = false;
                match result {
                    Ok(data) => {
                        state.authenticated = true;
                        state.user = Some(data.user);
                        state.password.clear();
                        state.status_message = "Signed in".to_owned();
                    }
                    Err(ApiError::Network(e)) => {
                        error!("Login failed: {e}");
                        state.login_error = "Could not reach the server".to_owned();
                        return;
                    }
                    Err(e) => {
                        error!("Login failed: {e}");
                        state.login_error = e.to_string();
                        return;
                    }
                }
            }
            APP_STATE.lock().unwrap().load_initial();
        });
    }

    pub fn logout(&mut self) {
        SESSION.clear();
        self.return_to_login(String::new());
        self.status_message = "Signed out".to_owned();
    }

    fn return_to_login(&mut self, login_error: String) {
        self.authenticated = false;
        self.user = None;
        self.password.clear();
        self.events.clear();
        self.all_votes.clear();
        self.votes.clear();
        self.selected_event = None;
        self.stats = VoteStats::default();
        self.pending_confirm = None;
        self.create_modal_open = false;
        self.login_error = login_error;
        self.status_message = "Not signed in".to_owned();
    }

    fn report_error(&mut self, what: &str, err: &ApiError) {
        error!("Failed to {what}: {err}");
        if let ApiError::AuthExpired(message) = err {
            self.return_to_login(message.clone());
        } else {
            self.status_message = format!("Failed to {what}: {err}");
        }
    }

    /// Initial load: events and the full vote set are fetched concurrently
    /// and both must land before the page counts as loaded.
    pub fn load_initial(&mut self) {
        self.loading_events = true;
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (events, votes) = rt.block_on(initial_load(&client, &SESSION, &base_url));

            let mut state = APP_STATE.lock().unwrap();
            state.loading_events = false;
            match events {
                Ok(events) => state.events = events,
                Err(e) => {
                    state.report_error("load events", &e);
                    return;
                }
            }
            match votes {
                Ok(votes) => state.apply_all_votes(votes),
                Err(e) => state.report_error("load votes", &e),
            }
        });
    }

    pub fn load_events(&mut self) {
        self.loading_events = true;
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(api::events::fetch_events(&client, &SESSION, &base_url));

            let mut state = APP_STATE.lock().unwrap();
            state.loading_events = false;
            match result {
                Ok(events) => state.events = events,
                Err(e) => state.report_error("load events", &e),
            }
        });
    }

    pub fn load_all_votes(&mut self) {
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(api::votes::fetch_all_votes(&client, &SESSION, &base_url));

            let mut state = APP_STATE.lock().unwrap();
            match result {
                Ok(votes) => state.apply_all_votes(votes),
                Err(e) => state.report_error("load votes", &e),
            }
        });
    }

    pub fn load_votes_for_event(&mut self, event_id: String) {
        self.loading_votes = true;
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(api::votes::fetch_event_votes(
                &client, &SESSION, &base_url, &event_id,
            ));

            let mut state = APP_STATE.lock().unwrap();
            state.loading_votes = false;
            match result {
                Ok(scoped) => state.apply_event_votes(scoped),
                Err(e) => state.report_error("load the event's votes", &e),
            }
        });
    }

    pub fn refresh(&mut self) {
        self.status_message = "Refreshing".to_owned();
        self.load_events();
        if let Some(event) = self.selected_event.clone() {
            self.load_votes_for_event(event.id);
        }
        self.load_all_votes();
    }

    pub fn open_create_modal(&mut self) {
        self.create_modal_open = true;
        self.new_event_name.clear();
        self.create_error.clear();
    }

    pub fn create_event(&mut self) {
        let name = self.new_event_name.clone();
        self.creating = true;
        self.create_error.clear();
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(create_event_flow(&client, &SESSION, &base_url, &name));

            let mut state = APP_STATE.lock().unwrap();
            state.creating = false;
            match result {
                Ok(events) => {
                    state.events = events;
                    state.create_modal_open = false;
                    state.new_event_name.clear();
                    state.status_message = format!("Poll \"{}\" created", name.trim());
                }
                Err(ApiError::Validation(message)) => state.create_error = message,
                Err(e) => {
                    state.create_error = e.to_string();
                    state.report_error("create the poll", &e);
                }
            }
        });
    }

    pub fn request_delete_event(&mut self, name: String) {
        self.pending_confirm = Some(ConfirmAction::DeleteEvent { name });
    }

    pub fn request_delete_vote(&mut self, id: String) {
        self.pending_confirm = Some(ConfirmAction::DeleteVote { id });
    }

    pub fn confirm_pending(&mut self) {
        let Some(action) = self.pending_confirm.take() else {
            return;
        };
        match action {
            ConfirmAction::DeleteEvent { name } => self.delete_event(name),
            ConfirmAction::DeleteVote { id } => self.delete_vote(id),
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending_confirm = None;
    }

    fn delete_event(&mut self, name: String) {
        let base_url = self.base_url();

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(delete_event_flow(&client, &SESSION, &base_url, &name));

            let mut state = APP_STATE.lock().unwrap();
            match result {
                Ok((events, votes)) => {
                    state.apply_event_deleted(&name);
                    state.events = events;
                    state.apply_all_votes(votes);
                    state.status_message = format!("Poll \"{name}\" deleted");
                }
                Err(e) => state.report_error("delete the poll", &e),
            }
        });
    }

    fn delete_vote(&mut self, id: String) {
        let base_url = self.base_url();
        let selected_id = self.selected_event.as_ref().map(|event| event.id.clone());

        std::thread::spawn(move || {
            let client = Client::new();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(delete_vote_flow(
                &client,
                &SESSION,
                &base_url,
                &id,
                selected_id.as_deref(),
            ));

            let mut state = APP_STATE.lock().unwrap();
            match result {
                Ok((scoped, all_votes)) => {
                    if let Some(scoped) = scoped {
                        state.apply_event_votes(scoped);
                    }
                    state.apply_all_votes(all_votes);
                    state.status_message = "Vote deleted".to_owned();
                }
                Err(e) => state.report_error("delete the vote", &e),
            }
        });
    }

    /// Silently ignores ids that are no longer in the local collection, for
    /// example after a concurrent deletion from another session.
    pub fn select_event(&mut self, event_id: &str) {
        let Some(event) = self.events.iter().find(|e| e.id == event_id).cloned() else {
            return;
        };
        self.selected_event = Some(event.clone());
        self.load_votes_for_event(event.id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_event = None;
        self.votes.clear();
    }

    fn apply_all_votes(&mut self, votes: Vec<Vote>) {
        self.all_votes = votes;
        self.stats.recompute(&self.all_votes);
    }

    fn apply_event_votes(&mut self, scoped: EventVotes) {
        self.votes = scoped.votes;
        if let Some(stats) = scoped.stats {
            self.stats = stats;
        }
    }

    fn apply_event_deleted(&mut self, name: &str) {
        if self
            .selected_event
            .as_ref()
            .is_some_and(|event| event.name == name)
        {
            self.selected_event = None;
            self.votes.clear();
        }
    }
}

pub async fn initial_load(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
) -> (
    Result<Vec<Event>, ApiError>,
    Result<Vec<Vote>, ApiError>,
) {
    futures_util::future::join(
        api::events::fetch_events(client, session, base_url),
        api::votes::fetch_all_votes(client, session, base_url),
    )
    .await
}

/// Create an event, then reload the collection: exactly one create call and
/// exactly one events fetch. Blank names are rejected before any request.
pub async fn create_event_flow(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    name: &str,
) -> Result<Vec<Event>, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation(
            "Please enter a name for the event".to_owned(),
        ));
    }
    api::events::create_event(client, session, base_url, name).await?;
    api::events::fetch_events(client, session, base_url).await
}

/// Delete an event (the server cascades to its votes), then resynchronize
/// the event collection and the full vote set, in that order.
pub async fn delete_event_flow(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    name: &str,
) -> Result<(Vec<Event>, Vec<Vote>), ApiError> {
    api::events::delete_event(client, session, base_url, name).await?;
    let events = api::events::fetch_events(client, session, base_url).await?;
    let votes = api::votes::fetch_all_votes(client, session, base_url).await?;
    Ok((events, votes))
}

/// Delete a vote, re-fetch the scoped view when an event is selected, and
/// always reload the full vote set so the global statistics stay correct.
pub async fn delete_vote_flow(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    vote_id: &str,
    selected_event_id: Option<&str>,
) -> Result<(Option<EventVotes>, Vec<Vote>), ApiError> {
    api::votes::delete_vote(client, session, base_url, vote_id).await?;
    let scoped = match selected_event_id {
        Some(event_id) => {
            Some(api::votes::fetch_event_votes(client, session, base_url, event_id).await?)
        }
        None => None,
    };
    let votes = api::votes::fetch_all_votes(client, session, base_url).await?;
    Ok((scoped, votes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::votes::EventRef;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event(id: &str, name: &str) -> Event {
        Event {
            id: id.to_owned(),
            name: name.to_owned(),
            vote_count: 0,
            last_vote: None,
        }
    }

    fn vote(id: &str, rating: i64) -> Vote {
        Vote {
            id: id.to_owned(),
            event: EventRef::Id("e1".to_owned()),
            name: "Ada".to_owned(),
            phone: "0600000000".to_owned(),
            rating,
            feedback: None,
            submitted_at: "2025-05-01T10:00:00Z".to_owned(),
        }
    }

    fn events_body() -> serde_json::Value {
        json!({
            "success": true,
            "data": [{"_id": "e1", "name": "Gala", "voteCount": 1}]
        })
    }

    fn votes_body() -> serde_json::Value {
        json!({
            "success": true,
            "data": [{
                "_id": "v1",
                "eventName": "e1",
                "name": "Ada",
                "phone": "0600000000",
                "rating": 8,
                "submittedAt": "2025-05-01T10:00:00Z"
            }]
        })
    }

    #[tokio::test]
    async fn blank_create_fails_validation_without_any_request() {
        let server = MockServer::start().await;
        let client = Client::new();
        let session = SessionStore::in_memory();

        for name in ["", "   "] {
            let result = create_event_flow(&client, &session, &server.uri(), name).await;
            assert!(matches!(result, Err(ApiError::Validation(_))));
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_issues_one_create_then_one_reload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let session = SessionStore::in_memory();
        let events = create_event_flow(&client, &session, &server.uri(), "  Launch Party  ")
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method.as_str(), "POST");
        assert_eq!(requests[1].method.as_str(), "GET");
    }

    #[tokio::test]
    async fn delete_event_reloads_events_then_votes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/votes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(votes_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let session = SessionStore::in_memory();
        let (events, votes) = delete_event_flow(&client, &session, &server.uri(), "Gala")
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(votes.len(), 1);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].method.as_str(), "DELETE");
        assert_eq!(requests[1].url.path(), "/admin/events");
        assert_eq!(requests[2].url.path(), "/admin/votes");
    }

    #[tokio::test]
    async fn delete_vote_refetches_scope_and_all_votes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/votes/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/votes/event/e1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/votes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(votes_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let session = SessionStore::in_memory();
        let (scoped, votes) =
            delete_vote_flow(&client, &session, &server.uri(), "v1", Some("e1"))
                .await
                .unwrap();

        assert!(scoped.unwrap().votes.is_empty());
        assert_eq!(votes.len(), 1);
    }

    #[tokio::test]
    async fn delete_vote_without_selection_skips_the_scoped_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/votes/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/votes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(votes_body()))
            .mount(&server)
            .await;

        let client = Client::new();
        let session = SessionStore::in_memory();
        let (scoped, _votes) = delete_vote_flow(&client, &session, &server.uri(), "v1", None)
            .await
            .unwrap();

        assert!(scoped.is_none());
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn selecting_an_unknown_id_changes_nothing() {
        let mut state = AppState::new();
        state.events = vec![event("e1", "Gala")];
        state.votes = vec![vote("v1", 8)];

        state.select_event("gone");

        assert!(state.selected_event.is_none());
        assert_eq!(state.votes.len(), 1);
    }

    #[test]
    fn deleting_the_selected_event_clears_selection_and_scoped_votes() {
        let mut state = AppState::new();
        state.selected_event = Some(event("e1", "Gala"));
        state.votes = vec![vote("v1", 8)];

        state.apply_event_deleted("Gala");

        assert!(state.selected_event.is_none());
        assert!(state.votes.is_empty());
    }

    #[test]
    fn deleting_another_event_keeps_the_selection() {
        let mut state = AppState::new();
        state.selected_event = Some(event("e1", "Gala"));
        state.votes = vec![vote("v1", 8)];

        state.apply_event_deleted("Launch Party");

        assert!(state.selected_event.is_some());
        assert_eq!(state.votes.len(), 1);
    }

    #[test]
    fn replacing_the_vote_collection_recomputes_stats() {
        let mut state = AppState::new();
        state.apply_all_votes(vec![vote("v1", 8), vote("v2", 6), vote("v3", 10)]);

        assert_eq!(state.stats.average_rating, "8.0");
        assert_eq!(state.stats.total_votes, 3);
        assert_eq!(state.stats.positive_count, 2);
        assert_eq!(state.stats.neutral_count, 1);
        assert_eq!(state.stats.negative_count, 0);
    }

    #[test]
    fn emptying_the_vote_collection_keeps_the_last_aggregate() {
        let mut state = AppState::new();
        state.apply_all_votes(vec![vote("v1", 8), vote("v2", 6), vote("v3", 10)]);
        state.apply_all_votes(Vec::new());

        assert_eq!(state.stats.average_rating, "8.0");
        assert_eq!(state.stats.total_votes, 3);
    }

    #[test]
    fn scoped_server_stats_override_the_local_aggregate() {
        let mut state = AppState::new();
        state.apply_all_votes(vec![vote("v1", 2)]);
        state.apply_event_votes(EventVotes {
            votes: vec![vote("v2", 9)],
            stats: Some(VoteStats {
                average_rating: "9.0".to_owned(),
                total_votes: 1,
                positive_count: 1,
                neutral_count: 0,
                negative_count: 0,
            }),
        });

        assert_eq!(state.stats.average_rating, "9.0");
        assert_eq!(state.votes.len(), 1);
    }

    #[test]
    fn scoped_fetch_without_stats_keeps_the_local_aggregate() {
        let mut state = AppState::new();
        state.apply_all_votes(vec![vote("v1", 2)]);
        state.apply_event_votes(EventVotes {
            votes: Vec::new(),
            stats: None,
        });

        assert_eq!(state.stats.average_rating, "2.0");
    }
}
