// Device API authentication
//
// Password login yielding an access token. The token is kept in the
// client's session and appended to every authenticated request; there is
// no logout or refresh on the device side.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{ACCESS_TOKEN, DeviceClient, Session};
use crate::error::Error;

const LOGIN_PATH: &str = "auth/login";

/// Result of a login attempt that reached a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A session token is held.
    Authenticated,
    /// No password configured, or the device refused the credentials.
    NotAuthenticated,
}

impl DeviceClient {
    /// Ensure a session exists.
    ///
    /// Returns immediately when a token is already held or the password is
    /// empty. Otherwise performs one `POST auth/login`. A refused login is
    /// reported as [`LoginOutcome::NotAuthenticated`], not as an error; only
    /// transport failures and timeouts surface as `Err`.
    pub async fn login(&self) -> Result<LoginOutcome, Error> {
        let mut session = self.session.lock().await;
        self.login_locked(&mut session).await
    }

    /// Login body; caller holds the session lock.
    pub(crate) async fn login_locked(&self, session: &mut Session) -> Result<LoginOutcome, Error> {
        if session.token.is_some() {
            return Ok(LoginOutcome::Authenticated);
        }
        if session.password.expose_secret().is_empty() {
            return Ok(LoginOutcome::NotAuthenticated);
        }

        let url = self.endpoint_url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let body = json!({
            "pwd": session.password.expose_secret(),
            "remember": 1,
        });

        let (status, text) = self.execute(self.http().post(url).json(&body)).await?;
        if !status.is_success() {
            warn!(address = %self.address(), %status, "login rejected");
            return Ok(LoginOutcome::NotAuthenticated);
        }

        match extract_access_token(&text) {
            Some(token) => {
                session.token = Some(SecretString::from(token));
                debug!("login successful");
                Ok(LoginOutcome::Authenticated)
            }
            None => {
                warn!(address = %self.address(), "login response carried no access token");
                Ok(LoginOutcome::NotAuthenticated)
            }
        }
    }
}

/// Pull the string `access_token` out of a flat JSON object.
fn extract_access_token(body: &str) -> Option<String> {
    let fields: HashMap<String, serde_json::Value> = serde_json::from_str(body).ok()?;
    fields
        .get(ACCESS_TOKEN)?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_extracted_from_flat_object() {
        let body = r#"{"access_token":"abc123","checksum":"x","expires_in":157680000,"statusCode":0}"#;
        assert_eq!(extract_access_token(body).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_non_string_token_is_none() {
        assert_eq!(extract_access_token(r#"{"statusCode":2}"#), None);
        assert_eq!(extract_access_token(r#"{"access_token":42}"#), None);
        assert_eq!(extract_access_token(r#"{"access_token":""}"#), None);
        assert_eq!(extract_access_token("[1,2,3]"), None);
        assert_eq!(extract_access_token("<html>"), None);
    }
}
