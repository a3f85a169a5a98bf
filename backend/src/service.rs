use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::identity::{Credentials, IdentityError, IdentityProvider};
use crate::store::NoteStore;
use crate::structs::{Identity, Note, NoteDraft, NoteVector};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Stateless request handling on top of the two adapters. Holds no per-user
/// state, so any number of instances can serve the same store.
#[derive(Clone)]
pub struct NotesService {
    identity: Arc<dyn IdentityProvider>,
    notes: Arc<dyn NoteStore>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> ApiResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Unable to validate email address: invalid format".into(),
        ))
    }
}

impl NotesService {
    pub fn new(identity: Arc<dyn IdentityProvider>, notes: Arc<dyn NoteStore>) -> Self {
        Self { identity, notes }
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<Identity> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        match self.identity.register(&email, password, name.trim()).await {
            Ok(identity) => {
                info!(user = %identity.id, "registered");
                Ok(identity)
            }
            Err(IdentityError::Rejected(reason)) => Err(ApiError::Validation(reason)),
            Err(e) => Err(provider_failure(e)),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(Identity, String)> {
        let credentials = Credentials {
            email: normalize_email(email),
            password: password.to_string(),
        };

        match self.identity.authenticate(&credentials).await {
            Ok(session) => Ok(session),
            Err(IdentityError::InvalidCredentials) => {
                warn!("failed login attempt");
                Err(AuthFailure::BadCredentials.into())
            }
            Err(e) => Err(provider_failure(e)),
        }
    }

    /// Gate in front of every note operation.
    pub async fn authenticate(&self, token: Option<&str>) -> ApiResult<Identity> {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthFailure::MissingToken.into()),
        };

        self.identity.verify(token).await.map_err(|e| match e {
            IdentityError::InvalidToken | IdentityError::InvalidCredentials => AuthFailure::InvalidToken.into(),
            IdentityError::ExpiredToken => AuthFailure::ExpiredToken.into(),
            e => provider_failure(e),
        })
    }

    pub async fn create_note(&self, caller: &Identity, draft: NoteDraft) -> ApiResult<Note> {
        self.notes
            .insert(&caller.id, &draft)
            .await
            .map_err(ApiError::storage)
    }

    pub async fn list_notes(&self, caller: &Identity) -> ApiResult<NoteVector> {
        self.notes
            .select_by_owner(&caller.id)
            .await
            .map_err(ApiError::storage)
    }

    pub async fn update_note(&self, caller: &Identity, note_id: i64, draft: NoteDraft) -> ApiResult<Note> {
        self.notes
            .update_by_id_and_owner(note_id, &caller.id, &draft)
            .await
            .map_err(ApiError::storage)?
            .ok_or(ApiError::NotFound)
    }

    /// Succeeds whether or not a row was removed.
    pub async fn delete_note(&self, caller: &Identity, note_id: i64) -> ApiResult<()> {
        self.notes
            .delete_by_id_and_owner(note_id, &caller.id)
            .await
            .map_err(ApiError::storage)?;
        Ok(())
    }
}

fn provider_failure(err: IdentityError) -> ApiError {
    match err {
        IdentityError::Unavailable(e) => ApiError::storage(e),
        other => ApiError::Storage(other.to_string()),
    }
}
