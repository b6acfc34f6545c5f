use serde::Deserialize;

use crate::session::ApiError;

pub mod auth;
pub mod events;
pub mod votes;

/// Every admin endpoint wraps its payload in `{success, data, message?}`.
/// A `success: false` envelope surfaces the server's message verbatim.
#[derive(Deserialize, Debug)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn rejection(message: Option<String>) -> ApiError {
        ApiError::Api(message.unwrap_or_else(|| "Request failed".to_owned()))
    }

    /// Succeeds only when the envelope reports success and carries data.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(Self::rejection(self.message));
        }
        self.data
            .ok_or_else(|| ApiError::Api("Response is missing data".to_owned()))
    }

    /// For mutations whose payload does not matter.
    pub fn ok(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(Self::rejection(self.message))
        }
    }
}
