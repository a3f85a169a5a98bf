//! In-process adapters, used by the tests and when `DATABASE_URL=memory`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::identity::{
    hash_password_blocking, new_token, token_expiry, verify_password_blocking, Credentials, IdentityError,
    IdentityProvider, DUPLICATE_EMAIL,
};
use crate::store::NoteStore;
use crate::structs::{Identity, Note, NoteDraft, NoteVector};

fn lock<T>(mutex: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow::anyhow!("In-memory state is poisoned"))
}

// Identities //////////////////////////////////////////////////////////////////////////////////////

struct Account {
    identity: Identity,
    password_hash: String,
}

struct IssuedToken {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Accounts {
    by_id: HashMap<String, Account>,
    tokens: HashMap<String, IssuedToken>,
}

pub struct MemoryIdentityProvider {
    accounts: Mutex<Accounts>,
    token_ttl: Duration,
}

impl MemoryIdentityProvider {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            accounts: Mutex::new(Accounts::default()),
            token_ttl,
        }
    }
}

#[rocket::async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError> {
        let password_hash = hash_password_blocking(password).await?;
        let mut accounts = lock(&self.accounts)?;

        if accounts.by_id.values().any(|a| a.identity.email == email) {
            return Err(IdentityError::Rejected(DUPLICATE_EMAIL.into()));
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        accounts.by_id.insert(
            identity.id.clone(),
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<(Identity, String), IdentityError> {
        // the guard must be gone before hashing starts
        let (identity, password_hash) = {
            let accounts = lock(&self.accounts)?;
            let account = accounts
                .by_id
                .values()
                .find(|a| a.identity.email == credentials.email)
                .ok_or(IdentityError::InvalidCredentials)?;
            (account.identity.clone(), account.password_hash.clone())
        };
        if !verify_password_blocking(&credentials.password, &password_hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }

        let expires_at = token_expiry(self.token_ttl)?;
        let token = new_token();
        let now = Utc::now();

        let mut accounts = lock(&self.accounts)?;
        accounts.tokens.retain(|_, issued| issued.expires_at > now);
        accounts.tokens.insert(
            token.clone(),
            IssuedToken {
                user_id: identity.id.clone(),
                expires_at,
            },
        );
        Ok((identity, token))
    }

    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let mut accounts = lock(&self.accounts)?;

        let issued = accounts.tokens.get(token).ok_or(IdentityError::InvalidToken)?;
        let expired = issued.expires_at <= Utc::now();
        let user_id = issued.user_id.clone();
        if expired {
            accounts.tokens.remove(token);
            return Err(IdentityError::ExpiredToken);
        }

        accounts
            .by_id
            .get(&user_id)
            .map(|a| a.identity.clone())
            .ok_or(IdentityError::InvalidToken)
    }
}

// Notes ///////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Note>,
}

#[derive(Default)]
pub struct MemoryNoteStore {
    table: Mutex<Table>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, owner_id: &str, draft: &NoteDraft) -> anyhow::Result<Note> {
        let mut table = lock(&self.table)?;
        table.next_id += 1;

        let note = Note {
            id: table.next_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now(),
        };
        table.rows.push(note.clone());
        Ok(note)
    }

    async fn select_by_owner(&self, owner_id: &str) -> anyhow::Result<NoteVector> {
        let table = lock(&self.table)?;

        let mut notes: NoteVector = table
            .rows
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn update_by_id_and_owner(
        &self,
        id: i64,
        owner_id: &str,
        draft: &NoteDraft,
    ) -> anyhow::Result<Option<Note>> {
        let mut table = lock(&self.table)?;

        Ok(table
            .rows
            .iter_mut()
            .find(|n| n.id == id && n.owner_id == owner_id)
            .map(|note| {
                note.title = draft.title.clone();
                note.content = draft.content.clone();
                note.clone()
            }))
    }

    async fn delete_by_id_and_owner(&self, id: i64, owner_id: &str) -> anyhow::Result<bool> {
        let mut table = lock(&self.table)?;

        let before = table.rows.len();
        table.rows.retain(|n| !(n.id == id && n.owner_id == owner_id));
        Ok(table.rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            title: title.into(),
            content: String::new(),
        }
    }

    #[rocket::async_test]
    async fn tokens_expire() {
        let provider = MemoryIdentityProvider::new(Duration::zero());
        provider.register("a@x.com", "secret1", "A").await.unwrap();
        let (_, token) = provider
            .authenticate(&Credentials {
                email: "a@x.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        assert!(matches!(provider.verify(&token).await, Err(IdentityError::ExpiredToken)));
        assert!(matches!(provider.verify(&token).await, Err(IdentityError::InvalidToken)));
    }

    #[rocket::async_test]
    async fn login_purges_expired_tokens() {
        let provider = MemoryIdentityProvider::new(Duration::zero());
        provider.register("a@x.com", "secret1", "A").await.unwrap();
        let credentials = Credentials {
            email: "a@x.com".into(),
            password: "secret1".into(),
        };
        for _ in 0..3 {
            provider.authenticate(&credentials).await.unwrap();
        }
        assert_eq!(provider.accounts.lock().unwrap().tokens.len(), 1);
    }

    #[rocket::async_test]
    async fn oversized_ttl_fails_login_without_panicking() {
        let provider = MemoryIdentityProvider::new(Duration::seconds(10_000_000_000_000));
        provider.register("a@x.com", "secret1", "A").await.unwrap();
        let outcome = provider
            .authenticate(&Credentials {
                email: "a@x.com".into(),
                password: "secret1".into(),
            })
            .await;
        assert!(matches!(outcome, Err(IdentityError::Unavailable(_))));
    }

    #[rocket::async_test]
    async fn wrong_password_is_rejected() {
        let provider = MemoryIdentityProvider::new(Duration::hours(1));
        provider.register("a@x.com", "secret1", "A").await.unwrap();
        let outcome = provider
            .authenticate(&Credentials {
                email: "a@x.com".into(),
                password: "secret2".into(),
            })
            .await;
        assert!(matches!(outcome, Err(IdentityError::InvalidCredentials)));
    }

    #[rocket::async_test]
    async fn notes_stay_with_their_owner() {
        let store = MemoryNoteStore::new();
        let note = store.insert("alice", &draft("a")).await.unwrap();
        store.insert("bob", &draft("b")).await.unwrap();

        assert_eq!(store.select_by_owner("alice").await.unwrap(), vec![note.clone()]);
        assert!(store
            .update_by_id_and_owner(note.id, "bob", &draft("x"))
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_by_id_and_owner(note.id, "bob").await.unwrap());
        assert!(store.delete_by_id_and_owner(note.id, "alice").await.unwrap());
    }

    #[rocket::async_test]
    async fn same_instant_orders_by_id() {
        let store = MemoryNoteStore::new();
        let first = store.insert("alice", &draft("1")).await.unwrap();
        let second = store.insert("alice", &draft("2")).await.unwrap();

        let ids: Vec<i64> = store
            .select_by_owner("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
