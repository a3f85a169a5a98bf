use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// An account as issued by the identity provider. Notes point at it through
/// `owner_id`, they never own it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

pub type NoteVector = Vec<Note>;

/// Title and content of a note as they are written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

// Request bodies //////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Clients send the note body as `description`, it is stored as `content`.
#[derive(Deserialize, Debug, Default)]
pub struct NoteBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NoteBody {
    pub fn into_draft(self) -> Result<NoteDraft, ApiError> {
        let title = self
            .title
            .ok_or_else(|| ApiError::Validation("Note title is required".into()))?;

        Ok(NoteDraft {
            title,
            content: self.description.unwrap_or_default(),
        })
    }
}

// Response bodies /////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user: Identity,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub user: Identity,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NotesResponse {
    pub notes: NoteVector,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NoteResponse {
    pub success: bool,
    pub note: Note,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
