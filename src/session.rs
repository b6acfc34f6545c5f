use std::path::PathBuf;
use std::sync::Mutex;

use log::{debug, warn};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::auth::AdminUser;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Api(String),
    #[error("server response is not JSON")]
    NonJsonResponse,
    #[error("{0}")]
    AuthExpired(String),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

/// Holds the bearer token in a process-local slot and, when a directory is
/// configured, mirrors it to a token file that survives restarts. The last
/// authenticated user profile is kept alongside for display purposes only.
pub struct SessionStore {
    memory: Mutex<Option<String>>,
    dir: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            memory: Mutex::new(None),
            dir,
        }
    }

    /// A store that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    fn token_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join("token"))
    }

    fn profile_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join("user.json"))
    }

    pub fn current_token(&self) -> Option<String> {
        if let Some(token) = self.memory.lock().unwrap().clone() {
            return Some(token);
        }
        let path = self.token_path()?;
        match std::fs::read_to_string(path) {
            Ok(token) => {
                let token = token.trim().to_owned();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(_) => None,
        }
    }

    pub fn set_token(&self, token: &str) {
        *self.memory.lock().unwrap() = Some(token.to_owned());
        if let Some(path) = self.token_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("Failed to create session directory: {e}");
                    return;
                }
            }
            if let Err(e) = std::fs::write(&path, token) {
                warn!("Failed to persist token: {e}");
            }
        }
    }

    pub fn clear(&self) {
        *self.memory.lock().unwrap() = None;
        if let Some(path) = self.token_path() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove token file: {e}");
                }
            }
        }
    }

    pub fn save_profile(&self, user: &AdminUser) {
        let Some(path) = self.profile_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create session directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(user) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Failed to persist user profile: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize user profile: {e}"),
        }
    }

    pub fn load_profile(&self) -> Option<AdminUser> {
        let path = self.profile_path()?;
        let json = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&json).ok()
    }
}

/// `$POLL_ADMIN_HOME` overrides the default `$HOME/.poll-admin` location.
pub fn default_store_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("POLL_ADMIN_HOME") {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".poll-admin"))
}

/// Sends `request` with the current credential attached. Mutating verbs get
/// a JSON content type unless the caller already set one; when no token is
/// stored the request goes out unauthenticated. Status codes are left for
/// the caller to interpret.
pub async fn authorized_request(
    client: &Client,
    session: &SessionStore,
    mut request: Request,
) -> Result<Response, ApiError> {
    let method = request.method();
    let is_mutation =
        method == Method::POST || method == Method::PUT || method == Method::PATCH;
    let headers = request.headers_mut();
    if is_mutation && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(token) = session.current_token() {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored token is not a valid header value, sending unauthenticated"),
        }
    }
    debug!("{} {}", request.method(), request.url());
    Ok(client.execute(request).await?)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Sends `request` and decodes the JSON body. A non-success status becomes
/// an `ApiError::Api` carrying the server's `message` field, the raw body
/// text, or a generic `HTTP error: <status>` fallback, in that order. A 401
/// additionally clears the session store; the credential is unrecoverable
/// and the caller is expected to send the user back to the login screen.
pub async fn authorized_request_json<T: DeserializeOwned>(
    client: &Client,
    session: &SessionStore,
    request: Request,
) -> Result<T, ApiError> {
    let response = authorized_request(client, session, request).await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    format!("HTTP error: {}", status.as_u16())
                } else {
                    text
                }
            });
        if status == StatusCode::UNAUTHORIZED {
            warn!("Server returned 401, clearing session");
            session.clear();
            return Err(ApiError::AuthExpired(message));
        }
        return Err(ApiError::Api(message));
    }
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if !is_json {
        return Err(ApiError::NonJsonResponse);
    }
    Ok(response.json::<T>().await?)
}
