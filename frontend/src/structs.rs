use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

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

#[derive(Serialize, Debug)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Serialize, Debug)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// What the server calls `description` is the note's content.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NoteBody {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    pub user: Identity,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub user: Identity,
    pub token: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotesResponse {
    pub notes: NoteVector,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
