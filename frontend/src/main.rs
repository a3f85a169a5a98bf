use serde::de::DeserializeOwned;
use yew::prelude::*;

use yew::format::{Json, Text};
use yew::services::fetch::{FetchService, FetchTask, Request, Response};
use yew::services::storage::{Area, StorageService};
use yew::services::{DialogService, Task};

use notes_frontend::api::{read_response, ApiClient, ApiOutcome};
use notes_frontend::config::{API_URL, SESSION_KEY};
use notes_frontend::session::{ClientSession, Session, SessionStorage};
use notes_frontend::structs::{
    LoginBody, LoginResponse, Note, NoteBody, NotesResponse, RegisterBody, RegisterResponse, SuccessResponse,
};
use notes_frontend::view_model::{NotesViewModel, Phase, Ticket};

/// Browser local storage, if the user allows it.
struct BrowserStorage {
    storage: Option<StorageService>,
}

impl SessionStorage for BrowserStorage {
    fn load(&self) -> Option<Session> {
        let storage = self.storage.as_ref()?;
        let restored: Json<Result<Session, anyhow::Error>> = storage.restore(SESSION_KEY);
        restored.0.ok()
    }

    fn save(&mut self, session: &Session) {
        if let Some(storage) = self.storage.as_mut() {
            storage.store(SESSION_KEY, Json(session));
        }
    }

    fn remove(&mut self) {
        if let Some(storage) = self.storage.as_mut() {
            storage.remove(SESSION_KEY);
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Page {
    Login,
    Register,
    Notes,
}

/// The note being written. `target` is `None` for a new note.
struct Editor {
    target: Option<i64>,
    title: String,
    description: String,
}

enum Msg {
    ShowPage(Page),
    EmailInput(String),
    PasswordInput(String),
    NameInput(String),
    SubmitLogin,
    SubmitRegister,
    LoggedIn(ApiOutcome<LoginResponse>),
    Registered(ApiOutcome<RegisterResponse>),
    Logout,

    Fetched(Ticket, ApiOutcome<NotesResponse>),
    Search(String),

    NewNote,
    EditNote(i64),
    EditTitle(String),
    EditDescription(String),
    CancelEdit,
    SaveNote,
    DeleteNote(i64),
    Mutated(Ticket, ApiOutcome<SuccessResponse>),
}

struct Model {
    link: ComponentLink<Self>,
    tasks: Vec<FetchTask>,
    api: ApiClient,
    session: ClientSession<BrowserStorage>,
    notes: NotesViewModel,
    page: Page,
    editor: Option<Editor>,

    email: String,
    password: String,
    name: String,

    message: String,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_props: Self::Properties, link: ComponentLink<Self>) -> Self {
        let storage = BrowserStorage {
            storage: StorageService::new(Area::Local).ok(),
        };
        let session = ClientSession::restore(storage);
        let page = if session.is_signed_in() { Page::Notes } else { Page::Login };

        let mut model = Self {
            link,
            tasks: Vec::new(),
            api: ApiClient::new(API_URL),
            session,
            notes: NotesViewModel::new(),
            page,
            editor: None,

            email: String::new(),
            password: String::new(),
            name: String::new(),

            message: String::new(),
        };

        model.fetch_notes();
        model
    }

    fn update(&mut self, msg: Self::Message) -> ShouldRender {
        match msg {
            Msg::ShowPage(page) => {
                self.page = page;
                self.message.clear();
            }
            Msg::EmailInput(value) => self.email = value,
            Msg::PasswordInput(value) => self.password = value,
            Msg::NameInput(value) => self.name = value,

            Msg::SubmitLogin => {
                let request = self.api.login(&LoginBody {
                    email: self.email.clone(),
                    password: self.password.clone(),
                });
                self.send(request, Msg::LoggedIn);
            }
            Msg::LoggedIn(outcome) => match outcome {
                ApiOutcome::Success(response) => {
                    self.notes.reset();
                    self.session.establish(response.user, response.token);
                    self.password.clear();
                    self.message.clear();
                    self.page = Page::Notes;
                    self.fetch_notes();
                }
                ApiOutcome::Unauthorized(_) => DialogService::alert("Invalid email or password"),
                ApiOutcome::Failed(message) => DialogService::alert(&message),
            },

            Msg::SubmitRegister => {
                let request = self.api.register(&RegisterBody {
                    email: self.email.clone(),
                    password: self.password.clone(),
                    name: self.name.clone(),
                });
                self.send(request, Msg::Registered);
            }
            Msg::Registered(outcome) => match outcome {
                ApiOutcome::Success(response) => {
                    self.email = response.user.email;
                    self.password.clear();
                    self.page = Page::Login;
                    self.message = "Account created, log in to continue".into();
                }
                ApiOutcome::Unauthorized(message) | ApiOutcome::Failed(message) => DialogService::alert(&message),
            },

            Msg::Logout => self.sign_out(),

            Msg::Fetched(ticket, outcome) => {
                // superseded by a newer fetch or a different session
                if !self.notes.accepts_fetch(ticket) {
                    return false;
                }
                match outcome {
                    ApiOutcome::Success(response) => self.notes.fetch_succeeded(ticket, response.notes),
                    ApiOutcome::Unauthorized(message) => self.session_rejected(&message),
                    ApiOutcome::Failed(message) => self.notes.fetch_failed(ticket, message),
                }
            }
            Msg::Search(term) => self.notes.set_search(term),

            Msg::NewNote => {
                self.editor = Some(Editor {
                    target: None,
                    title: String::new(),
                    description: String::new(),
                });
            }
            Msg::EditNote(id) => {
                self.editor = self.notes.find(id).map(|note| Editor {
                    target: Some(note.id),
                    title: note.title.clone(),
                    description: note.content.clone(),
                });
            }
            Msg::EditTitle(value) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.title = value;
                }
            }
            Msg::EditDescription(value) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.description = value;
                }
            }
            Msg::CancelEdit => self.editor = None,
            Msg::SaveNote => self.save_note(),
            Msg::DeleteNote(id) => {
                if let Some(session) = self.session.current().cloned() {
                    let ticket = self.notes.begin_mutation();
                    let request = self.api.delete_note(&session, id);
                    self.send(request, move |outcome| Msg::Mutated(ticket, outcome));
                }
            }
            Msg::Mutated(ticket, outcome) => {
                if !self.notes.accepts_mutation(ticket) {
                    return false;
                }
                match outcome {
                    ApiOutcome::Success(_) => {
                        self.editor = None;
                        if let Some(ticket) = self.notes.mutation_acknowledged(ticket) {
                            self.request_list(ticket);
                        }
                    }
                    ApiOutcome::Unauthorized(message) => self.session_rejected(&message),
                    ApiOutcome::Failed(message) => self.notes.mutation_failed(ticket, message),
                }
            }
        }

        if let Some(notice) = self.notes.take_notice() {
            DialogService::alert(&notice);
        }

        true
    }

    fn change(&mut self, _props: Self::Properties) -> ShouldRender {
        false
    }

    fn view(&self) -> Html {
        let page = match self.page {
            Page::Login => self.view_login(),
            Page::Register => self.view_register(),
            Page::Notes => self.view_notes_page(),
        };

        html! {
            <div>
                <h1>{"notes"}</h1>
                { page }
                <div class="result">{ &self.message }</div>
            </div>
        }
    }
}

impl Model {
    fn send<T, F>(&mut self, request: anyhow::Result<Request<Text>>, to_msg: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(ApiOutcome<T>) -> Msg + 'static,
    {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                DialogService::alert(&format!("Failed to build request: {}", e));
                return;
            }
        };

        let callback = self.link.callback(move |response: Response<Text>| {
            let (meta, body) = response.into_parts();
            to_msg(read_response(meta.status.as_u16(), body))
        });

        match FetchService::fetch(request, callback) {
            Ok(task) => {
                self.tasks.retain(|task| task.is_active());
                self.tasks.push(task);
            }
            Err(e) => DialogService::alert(&format!("Failed to send request: {}", e)),
        }
    }

    fn fetch_notes(&mut self) {
        if self.session.is_signed_in() {
            let ticket = self.notes.begin_fetch();
            self.request_list(ticket);
        }
    }

    fn request_list(&mut self, ticket: Ticket) {
        if let Some(session) = self.session.current().cloned() {
            let request = self.api.list_notes(&session);
            self.send(request, move |outcome| Msg::Fetched(ticket, outcome));
        }
    }

    fn save_note(&mut self) {
        let (editor, session) = match (self.editor.as_ref(), self.session.current().cloned()) {
            (Some(editor), Some(session)) => (editor, session),
            _ => return,
        };
        // Nothing to save
        if editor.title.is_empty() && editor.description.is_empty() {
            return;
        }

        let body = NoteBody {
            title: editor.title.clone(),
            description: editor.description.clone(),
        };
        let request = match editor.target {
            Some(id) => self.api.update_note(&session, id, &body),
            None => self.api.create_note(&session, &body),
        };
        let ticket = self.notes.begin_mutation();
        self.send(request, move |outcome| Msg::Mutated(ticket, outcome));
    }

    fn sign_out(&mut self) {
        self.session.clear();
        self.notes.reset();
        self.editor = None;
        self.password.clear();
        self.page = Page::Login;
    }

    fn session_rejected(&mut self, reason: &str) {
        self.sign_out();
        DialogService::alert(&format!("{}. Please log in again.", reason));
    }

    fn view_login(&self) -> Html {
        html! {
            <div class="authForm">
                <h2>{ "Login" }</h2>
                <input type="email"
                    value=self.email.clone()
                    oninput=self.link.callback(|e: InputData| Msg::EmailInput(e.value))
                    placeholder="Enter Email" />
                <input type="password"
                    value=self.password.clone()
                    oninput=self.link.callback(|e: InputData| Msg::PasswordInput(e.value))
                    placeholder="Enter Password" />
                <button onclick=self.link.callback(|_| Msg::SubmitLogin)>{ "Login" }</button>
                <p>
                    { "Don't have an account? " }
                    <a onclick=self.link.callback(|_| Msg::ShowPage(Page::Register))>{ "Register" }</a>
                </p>
            </div>
        }
    }

    fn view_register(&self) -> Html {
        html! {
            <div class="authForm">
                <h2>{ "Sign up" }</h2>
                <input type="text"
                    value=self.name.clone()
                    oninput=self.link.callback(|e: InputData| Msg::NameInput(e.value))
                    placeholder="Enter Name" />
                <input type="email"
                    value=self.email.clone()
                    oninput=self.link.callback(|e: InputData| Msg::EmailInput(e.value))
                    placeholder="Enter Email" />
                <input type="password"
                    value=self.password.clone()
                    oninput=self.link.callback(|e: InputData| Msg::PasswordInput(e.value))
                    placeholder="Enter Password" />
                <button onclick=self.link.callback(|_| Msg::SubmitRegister)>{ "Sign up" }</button>
                <p>
                    { "Already have an account? " }
                    <a onclick=self.link.callback(|_| Msg::ShowPage(Page::Login))>{ "Login" }</a>
                </p>
            </div>
        }
    }

    fn view_header(&self) -> Html {
        let (name, email) = match self.session.identity() {
            Some(identity) if !identity.display_name.is_empty() => {
                (identity.display_name.clone(), identity.email.clone())
            }
            Some(identity) => ("User".to_string(), identity.email.clone()),
            None => ("User".to_string(), String::new()),
        };

        html! {
            <header class="topBar">
                <input type="text"
                    value=self.notes.search().to_string()
                    oninput=self.link.callback(|e: InputData| Msg::Search(e.value))
                    placeholder="Search notes..." />
                <div class="profile">
                    <b>{ name }</b>
                    <span class="email">{ email }</span>
                    <button onclick=self.link.callback(|_| Msg::Logout)>{ "Logout" }</button>
                </div>
            </header>
        }
    }

    fn view_editor(&self, editor: &Editor) -> Html {
        let (heading, action) = match editor.target {
            Some(_) => ("Edit Note", "Update Note"),
            None => ("Add New Note", "Add Note"),
        };

        html! {
            <div class="submitArea">
                <h2>{ heading }</h2>
                <textarea rows=1
                    value=editor.title.clone()
                    oninput=self.link.callback(|e: InputData| Msg::EditTitle(e.value))
                    placeholder="Note Title">
                </textarea>
                <textarea rows=5
                    value=editor.description.clone()
                    oninput=self.link.callback(|e: InputData| Msg::EditDescription(e.value))
                    placeholder="Note Description">
                </textarea>
                <div class="submitButton">
                    <button onclick=self.link.callback(|_| Msg::SaveNote)>{ action }</button>
                    <button onclick=self.link.callback(|_| Msg::CancelEdit)>{ "Cancel" }</button>
                </div>
            </div>
        }
    }

    fn view_note(&self, note: &Note) -> Html {
        let id = note.id;
        let created = note.created_at.format("%Y-%m-%d %H:%M").to_string();

        html! {
            <div class="note">
                <div class="noteCreated">{ "Created: " }{ created }</div>
                <div class="noteTitle">
                    <b>{ &note.title }</b>
                </div>
                <div class="noteContent">
                    { &note.content }
                </div>
                <div class="noteButtons">
                    <button onclick=self.link.callback(move |_| Msg::EditNote(id))>{ "Edit" }</button>
                    <button onclick=self.link.callback(move |_| Msg::DeleteNote(id))>{ "Delete" }</button>
                </div>
            </div>
        }
    }

    fn view_notes_page(&self) -> Html {
        let status = match self.notes.phase() {
            Phase::Loading => html! { <div class="status">{ "Loading notes..." }</div> },
            Phase::Error(message) => html! { <div class="status error">{ message }</div> },
            Phase::Loaded if self.notes.notes().is_empty() => {
                html! { <div class="status">{ "No notes yet" }</div> }
            }
            _ => html! {},
        };
        let editor = match self.editor.as_ref() {
            Some(editor) => self.view_editor(editor),
            None => html! {
                <button class="createNote" onclick=self.link.callback(|_| Msg::NewNote)>{ "+ Create Note" }</button>
            },
        };
        let notes = self.notes.visible().into_iter().map(|note| self.view_note(note));

        html! {
            <>
                { self.view_header() }
                { editor }
                { status }
                <div class="mainContent">{ for notes }</div>
            </>
        }
    }
}

fn main() {
    yew::start_app::<Model>();
}
