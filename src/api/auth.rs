use log::{debug, info};
use reqwest::Client;

use crate::api::ApiEnvelope;
use crate::models::auth::{LoginData, LoginRequest};
use crate::session::{authorized_request_json, ApiError, SessionStore};

/// Authenticates the operator. On success the token is written to both
/// session stores and the user profile is persisted for display.
pub async fn login(
    client: &Client,
    session: &SessionStore,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<LoginData, ApiError> {
    debug!("Logging in as {email}");
    let request = client
        .post(format!("{base_url}/login"))
        .json(&LoginRequest { email, password })
        .build()?;
    let envelope: ApiEnvelope<LoginData> =
        authorized_request_json(client, session, request).await?;
    let data = envelope.into_data()?;
    session.set_token(&data.token);
    session.save_profile(&data.user);
    info!("Logged in as {} ({})", data.user.email, data.user.role);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn login_stores_token_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(
                json!({"email": "admin@example.com", "password": "secret"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "token": "tok-1",
                    "user": {"_id": "u1", "email": "admin@example.com", "role": "admin"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let dir = TempDir::new().unwrap();
        let session = SessionStore::new(Some(dir.path().to_path_buf()));
        let data = login(
            &client,
            &session,
            &server.uri(),
            "admin@example.com",
            "secret",
        )
        .await
        .unwrap();

        assert_eq!(data.user.role, "admin");
        assert_eq!(session.current_token().as_deref(), Some("tok-1"));
        assert_eq!(
            session.load_profile().unwrap().email,
            "admin@example.com"
        );
    }

    #[tokio::test]
    async fn rejected_login_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let session = SessionStore::in_memory();
        let result = login(&client, &session, &server.uri(), "a@b.c", "nope").await;

        // 401 goes through the expiry path but keeps the server's message.
        match result {
            Err(ApiError::AuthExpired(message)) => assert_eq!(message, "Bad credentials"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(session.current_token(), None);
    }
}
