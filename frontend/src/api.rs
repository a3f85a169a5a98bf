//! Requests the app sends and how their responses are read. Building and
//! reading are kept apart from `FetchService` so they work outside a browser.

use serde::de::DeserializeOwned;
use serde::Serialize;
use yew::format::{Nothing, Text};
use yew::services::fetch::Request;

use crate::session::Session;
use crate::structs::{ErrorBody, LoginBody, NoteBody, RegisterBody};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// The server refused the token or the credentials.
    Unauthorized(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

fn json_text<B: Serialize>(body: &B) -> anyhow::Result<Text> {
    Ok(Ok(serde_json::to_string(body)?))
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn register(&self, body: &RegisterBody) -> anyhow::Result<Request<Text>> {
        Ok(Request::post(self.url("/register"))
            .header("Content-Type", "application/json")
            .body(json_text(body)?)?)
    }

    pub fn login(&self, body: &LoginBody) -> anyhow::Result<Request<Text>> {
        Ok(Request::post(self.url("/login"))
            .header("Content-Type", "application/json")
            .body(json_text(body)?)?)
    }

    pub fn list_notes(&self, session: &Session) -> anyhow::Result<Request<Text>> {
        Ok(Request::get(self.url("/notes"))
            .header("Authorization", session.bearer())
            .body(Nothing.into())?)
    }

    pub fn create_note(&self, session: &Session, body: &NoteBody) -> anyhow::Result<Request<Text>> {
        Ok(Request::post(self.url("/notes"))
            .header("Content-Type", "application/json")
            .header("Authorization", session.bearer())
            .body(json_text(body)?)?)
    }

    pub fn update_note(&self, session: &Session, id: i64, body: &NoteBody) -> anyhow::Result<Request<Text>> {
        Ok(Request::put(self.url(&format!("/notes/{}", id)))
            .header("Content-Type", "application/json")
            .header("Authorization", session.bearer())
            .body(json_text(body)?)?)
    }

    pub fn delete_note(&self, session: &Session, id: i64) -> anyhow::Result<Request<Text>> {
        Ok(Request::delete(self.url(&format!("/notes/{}", id)))
            .header("Authorization", session.bearer())
            .body(Nothing.into())?)
    }
}

/// Turn a status code and raw body into an outcome. Error bodies carry
/// `{"error": ...}`, anything else falls back to the status code.
pub fn read_response<T: DeserializeOwned>(status: u16, body: Text) -> ApiOutcome<T> {
    let text = match body {
        Ok(text) => text,
        Err(e) => return ApiOutcome::Failed(format!("Could not reach the server: {}", e)),
    };

    if (200..300).contains(&status) {
        return match serde_json::from_str(&text) {
            Ok(value) => ApiOutcome::Success(value),
            Err(e) => ApiOutcome::Failed(format!("Unexpected response from server: {}", e)),
        };
    }

    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("Request failed with status {}", status));
    if status == 401 {
        ApiOutcome::Unauthorized(message)
    } else {
        ApiOutcome::Failed(message)
    }
}
