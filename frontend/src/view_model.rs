//! Client-side copy of the signed-in user's notes.
//!
//! The list is never patched locally. Every create, edit or delete waits for
//! the server and then fetches the whole list again, so what is shown is at
//! worst stale, never made up.
//!
//! Each request is tagged with a [`Ticket`]. A response whose ticket is no
//! longer current (a newer fetch went out, or the session changed since) is
//! dropped without touching the model.

use crate::structs::{Note, NoteVector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No session, nothing fetched.
    Empty,
    Loading,
    Loaded,
    Error(String),
}

/// Tag carried by an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    fetch: u64,
}

#[derive(Debug)]
pub struct NotesViewModel {
    phase: Phase,
    notes: NoteVector,
    search: String,
    notice: Option<String>,
    /// Bumped on every reset, so nothing sent for an earlier session lands.
    epoch: u64,
    /// Bumped on every fetch; only the latest one may fill the list.
    fetch: u64,
}

impl Default for NotesViewModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive substring match on title or content.
pub fn matches(note: &Note, term: &str) -> bool {
    let term = term.to_lowercase();
    note.title.to_lowercase().contains(&term) || note.content.to_lowercase().contains(&term)
}

impl NotesViewModel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Empty,
            notes: NoteVector::new(),
            search: String::new(),
            notice: None,
            epoch: 0,
            fetch: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The last list the server sent, unfiltered.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            fetch: self.fetch,
        }
    }

    /// True when a list response for `ticket` may still be applied.
    pub fn accepts_fetch(&self, ticket: Ticket) -> bool {
        ticket == self.ticket()
    }

    /// True when `ticket` was issued under the current session.
    pub fn accepts_mutation(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    pub fn begin_fetch(&mut self) -> Ticket {
        self.fetch += 1;
        self.phase = Phase::Loading;
        self.ticket()
    }

    /// Tag for a create, edit or delete about to be sent.
    pub fn begin_mutation(&self) -> Ticket {
        self.ticket()
    }

    pub fn fetch_succeeded(&mut self, ticket: Ticket, notes: NoteVector) {
        if !self.accepts_fetch(ticket) {
            return;
        }
        self.notes = notes;
        self.phase = Phase::Loaded;
    }

    /// The previous list stays on screen.
    pub fn fetch_failed(&mut self, ticket: Ticket, message: impl Into<String>) {
        if !self.accepts_fetch(ticket) {
            return;
        }
        let message = message.into();
        self.notice = Some(message.clone());
        self.phase = Phase::Error(message);
    }

    /// The server accepted a mutation. Returns the ticket of the fetch the
    /// caller sends next, or `None` when the session has changed since.
    pub fn mutation_acknowledged(&mut self, ticket: Ticket) -> Option<Ticket> {
        if !self.accepts_mutation(ticket) {
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Leaves the phase and the list exactly as they were.
    pub fn mutation_failed(&mut self, ticket: Ticket, message: impl Into<String>) {
        if !self.accepts_mutation(ticket) {
            return;
        }
        self.notice = Some(message.into());
    }

    /// Back to the signed-out state. Requests still in flight are orphaned.
    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch + 1,
            ..Self::new()
        };
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Notes to show for the current search term, in fetch order.
    pub fn visible(&self) -> Vec<&Note> {
        if self.phase == Phase::Empty {
            return Vec::new();
        }
        self.notes.iter().filter(|n| matches(n, &self.search)).collect()
    }

    pub fn find(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// A pending message for the user, handed out once.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}
