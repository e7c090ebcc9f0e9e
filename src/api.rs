//! Chat backend client that spends the managed credential
use crate::error::{AuthError, Result};
use crate::exchange::TokenExchange;
use crate::manager::TokenLifecycleManager;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    error: String,
}

/// Client for the chat backend's `/chat` endpoint
///
/// The credential-spending boundary of the application: each request asks
/// the session's lifecycle manager for a valid access token and presents it
/// as a bearer credential. Rendering and message storage live elsewhere.
pub struct ChatClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Send one chat message on behalf of a session
    ///
    /// A refresh failure from the manager propagates as-is so the caller
    /// can prompt re-authentication.
    pub fn send<E: TokenExchange>(
        &self,
        tokens: &TokenLifecycleManager<E>,
        input: &str,
    ) -> Result<String> {
        let access_token = tokens.get_valid_token()?;

        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .bearer_auth(&access_token)
            .json(&ChatRequest { input })
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ChatErrorBody>(&body)
                .map(|reply| reply.error)
                .unwrap_or(body);
            return Err(AuthError::InvalidResponse(format!(
                "chat backend returned {}: {}",
                status, detail
            )));
        }

        let reply: ChatReply = serde_json::from_str(&body)?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_wire_shape() {
        let body = serde_json::to_string(&ChatRequest { input: "hello" }).unwrap();
        assert_eq!(body, r#"{"input":"hello"}"#);
    }

    #[test]
    fn test_chat_reply_parses() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"hi there"}"#).unwrap();
        assert_eq!(reply.response, "hi there");
    }

    #[test]
    fn test_chat_error_body_parses() {
        let body: ChatErrorBody =
            serde_json::from_str(r#"{"error":"No input provided"}"#).unwrap();
        assert_eq!(body.error, "No input provided");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
