//! Login handshake against the account server.
//!
//! The arena server does not check passwords itself. After connecting it
//! sends a `challstr`; the client trades that challenge (plus credentials)
//! for a signed assertion at the account server, then claims its name on
//! the arena server with `/trn <name>,0,<assertion>`.
//!
//! [`AccountServer`] is the seam: [`HttpAccountServer`] talks to the real
//! endpoint, tests substitute their own.

use std::future::Future;

use serde::Deserialize;
use tracing::{debug, error};

use crate::SessionError;

/// Default login endpoint.
pub const DEFAULT_LOGIN_URI: &str = "https://play.pokemonshowdown.com/action.php";

/// Default replay upload endpoint.
pub const DEFAULT_REPLAY_UPLOAD_URI: &str =
    "https://play.pokemonshowdown.com/~~showdown/action.php?act=uploadreplay";

/// The account server: issues login assertions and stores replays.
pub trait AccountServer: Send + Sync + 'static {
    /// Trades the challenge string for an assertion.
    ///
    /// `challstr` is `<client id>|<challenge>`. Without a password the
    /// server is asked for an assertion for an unregistered name.
    fn assertion(
        &self,
        username: &str,
        password: Option<&str>,
        challstr: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Uploads a saved replay log.
    fn upload_replay(
        &self,
        log: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// [`AccountServer`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpAccountServer {
    client: reqwest::Client,
    login_uri: String,
    replay_upload_uri: String,
}

impl HttpAccountServer {
    pub fn new(login_uri: impl Into<String>, replay_upload_uri: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            login_uri: login_uri.into(),
            replay_upload_uri: replay_upload_uri.into(),
        }
    }
}

impl Default for HttpAccountServer {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_URI, DEFAULT_REPLAY_UPLOAD_URI)
    }
}

impl AccountServer for HttpAccountServer {
    async fn assertion(
        &self,
        username: &str,
        password: Option<&str>,
        challstr: &str,
    ) -> Result<String, SessionError> {
        let request = match password {
            Some(password) => self.client.post(&self.login_uri).form(&[
                ("act", "login"),
                ("name", username),
                ("pass", password),
                ("challstr", challstr),
            ]),
            None => self.client.post(&self.login_uri).form(&[
                ("act", "getassertion"),
                ("userid", username),
                ("challstr", challstr),
            ]),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(%status, body = %body, "could not log in");
            return Err(SessionError::Login(format!(
                "account server returned {status}"
            )));
        }

        parse_login_response(&body, password.is_some())
    }

    async fn upload_replay(&self, log: &str, id: &str) -> Result<(), SessionError> {
        let response = self
            .client
            .post(&self.replay_upload_uri)
            .form(&[("log", log), ("id", id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::SaveReplay(format!(
                "upload returned {status}: {body}"
            )));
        }
        debug!(id, "replay uploaded");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    actionerror: Option<String>,
    assertion: Option<String>,
}

/// Extracts the assertion from a successful login response body.
///
/// A password login answers with `]` followed by a JSON object; an
/// assertion-only login answers with the bare assertion. Either way an
/// assertion starting with `;;` is an error message in disguise.
pub fn parse_login_response(body: &str, with_password: bool) -> Result<String, SessionError> {
    let assertion = if with_password {
        let json = body.strip_prefix(']').unwrap_or(body);
        let response: LoginResponse = serde_json::from_str(json)
            .map_err(|e| SessionError::Login(format!("unreadable login response: {e}")))?;
        if let Some(reason) = response.actionerror {
            return Err(SessionError::Login(reason));
        }
        response
            .assertion
            .ok_or_else(|| SessionError::Login("login response carried no assertion".into()))?
    } else {
        body.trim().to_string()
    };

    if let Some(reason) = assertion.strip_prefix(";;") {
        return Err(SessionError::Login(reason.to_string()));
    }
    if assertion.is_empty() {
        return Err(SessionError::Login("empty assertion".into()));
    }
    Ok(assertion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response_password_ok() {
        let body = r#"]{"actionsuccess":true,"assertion":"abc,def"}"#;

        assert_eq!(parse_login_response(body, true).unwrap(), "abc,def");
    }

    #[test]
    fn test_parse_login_response_password_actionerror() {
        let body = r#"]{"actionerror":"Wrong password."}"#;

        let err = parse_login_response(body, true).unwrap_err();
        assert!(matches!(err, SessionError::Login(reason) if reason == "Wrong password."));
    }

    #[test]
    fn test_parse_login_response_bare_assertion() {
        assert_eq!(parse_login_response("abc123\n", false).unwrap(), "abc123");
    }

    #[test]
    fn test_parse_login_response_double_semicolon_is_error() {
        let err = parse_login_response(";;This name is registered.", false).unwrap_err();

        assert!(matches!(err, SessionError::Login(reason) if reason == "This name is registered."));
    }

    #[test]
    fn test_parse_login_response_garbage_is_login_error() {
        assert!(matches!(
            parse_login_response("<html>", true),
            Err(SessionError::Login(_))
        ));
    }
}
