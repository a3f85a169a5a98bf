use std::sync::Arc;

use chrono::Duration;
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use serde_json::{json, Value};

use notes_backend::build_rocket;
use notes_backend::config::Config;
use notes_backend::memory::{MemoryIdentityProvider, MemoryNoteStore};
use notes_backend::service::NotesService;
use notes_backend::structs::{ErrorBody, LoginResponse, NoteResponse, NotesResponse, RegisterResponse};

fn client_with_ttl(ttl: Duration) -> Client {
    let service = NotesService::new(
        Arc::new(MemoryIdentityProvider::new(ttl)),
        Arc::new(MemoryNoteStore::new()),
    );
    Client::tracked(build_rocket(service, &Config::default())).expect("valid rocket instance")
}

fn client() -> Client {
    client_with_ttl(Duration::hours(1))
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

fn register(client: &Client, email: &str, password: &str, name: &str) -> Status {
    client
        .post("/register")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password, "name": name }).to_string())
        .dispatch()
        .status()
}

fn login(client: &Client, email: &str, password: &str) -> LoginResponse {
    let response = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json().expect("login body")
}

fn signed_in(client: &Client, email: &str) -> String {
    assert_eq!(register(client, email, "password", "Someone"), Status::Created);
    login(client, email, "password").token
}

fn create(client: &Client, token: &str, title: &str, description: &str) -> Status {
    client
        .post("/notes")
        .header(ContentType::JSON)
        .header(bearer(token))
        .body(json!({ "title": title, "description": description }).to_string())
        .dispatch()
        .status()
}

fn list(client: &Client, token: &str) -> NotesResponse {
    let response = client.get("/notes").header(bearer(token)).dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json().expect("notes body")
}

#[test]
fn register_login_create_list() {
    let client = client();

    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body(r#"{"email":"a@x.com","password":"pw1234","name":"A"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    let registered: RegisterResponse = response.into_json().unwrap();
    assert_eq!(registered.message, "User registered");
    assert_eq!(registered.user.email, "a@x.com");
    assert_eq!(registered.user.display_name, "A");

    let session = login(&client, "a@x.com", "pw1234");
    assert_eq!(session.message, "Successfully Logged In");
    assert_eq!(session.user, registered.user);

    let response = client
        .post("/notes")
        .header(ContentType::JSON)
        .header(bearer(&session.token))
        .body(r#"{"title":"Hi","description":"there"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_json::<Value>().unwrap(), json!({ "success": true }));

    let notes = list(&client, &session.token).notes;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Hi");
    assert_eq!(notes[0].content, "there");
    assert_eq!(notes[0].owner_id, session.user.id);
}

#[test]
fn password_is_never_echoed() {
    let client = client();
    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body(r#"{"email":"a@x.com","password":"hunter22","name":"A"}"#)
        .dispatch();
    let body = response.into_string().unwrap();
    assert!(!body.contains("hunter22"));
    assert!(!body.contains("password"));
}

#[test]
fn rejected_registrations_are_400() {
    let client = client();
    assert_eq!(register(&client, "a@x.com", "pw", "A"), Status::BadRequest);
    assert_eq!(register(&client, "nope", "password", "A"), Status::BadRequest);
    assert_eq!(register(&client, "a@x.com", "password", "A"), Status::Created);

    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body(r#"{"email":"a@x.com","password":"password","name":"again"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let body: ErrorBody = response.into_json().unwrap();
    assert_eq!(body.error, "User already registered");
}

#[test]
fn malformed_json_is_400() {
    let client = client();
    let response = client
        .post("/register")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert!(response.into_json::<ErrorBody>().is_some());
}

#[test]
fn bad_login_is_401() {
    let client = client();
    register(&client, "a@x.com", "password", "A");

    let response = client
        .post("/login")
        .header(ContentType::JSON)
        .body(r#"{"email":"a@x.com","password":"wrong-one"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: ErrorBody = response.into_json().unwrap();
    assert_eq!(body.error, "Invalid login credentials");
}

#[test]
fn notes_without_token_are_401_and_empty() {
    let client = client();
    let token = signed_in(&client, "a@x.com");
    assert_eq!(create(&client, &token, "private", "stuff"), Status::Ok);

    let response = client.get("/notes").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body, json!({ "error": "No token" }));
}

#[test]
fn invalid_and_expired_tokens_are_401() {
    let client = client();
    let response = client.get("/notes").header(bearer("forged")).dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(response.into_json::<ErrorBody>().unwrap().error, "Invalid token");

    let client = client_with_ttl(Duration::zero());
    let token = signed_in(&client, "a@x.com");
    let response = client.get("/notes").header(bearer(&token)).dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(response.into_json::<ErrorBody>().unwrap().error, "Token expired");
}

#[test]
fn listing_is_owner_scoped_newest_first() {
    let client = client();
    let alice = signed_in(&client, "alice@x.com");
    let bob = signed_in(&client, "bob@x.com");

    create(&client, &alice, "first", "");
    create(&client, &bob, "bob's", "");
    create(&client, &alice, "second", "");

    let titles: Vec<String> = list(&client, &alice).notes.into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["second", "first"]);

    let titles: Vec<String> = list(&client, &bob).notes.into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["bob's"]);
}

#[test]
fn update_round_trip() {
    let client = client();
    let token = signed_in(&client, "a@x.com");
    create(&client, &token, "draft", "v1");
    let id = list(&client, &token).notes[0].id;

    let response = client
        .put(format!("/notes/{}", id))
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"title":"final","description":"v2"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let updated: NoteResponse = response.into_json().unwrap();
    assert!(updated.success);
    assert_eq!(updated.note.id, id);
    assert_eq!(updated.note.title, "final");
    assert_eq!(updated.note.content, "v2");

    assert_eq!(list(&client, &token).notes, vec![updated.note]);
}

#[test]
fn foreign_update_is_not_found_and_changes_nothing() {
    let client = client();
    let alice = signed_in(&client, "alice@x.com");
    let mallory = signed_in(&client, "mallory@x.com");
    create(&client, &alice, "mine", "keep out");
    let original = list(&client, &alice).notes;

    let response = client
        .put(format!("/notes/{}", original[0].id))
        .header(ContentType::JSON)
        .header(bearer(&mallory))
        .body(r#"{"title":"pwned","description":""}"#)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(response.into_json::<ErrorBody>().unwrap().error, "Note not found");

    let missing = client
        .put("/notes/999")
        .header(ContentType::JSON)
        .header(bearer(&alice))
        .body(r#"{"title":"x","description":""}"#)
        .dispatch();
    assert_eq!(missing.status(), Status::BadRequest);
    assert_eq!(missing.into_json::<ErrorBody>().unwrap().error, "Note not found");

    assert_eq!(list(&client, &alice).notes, original);
}

#[test]
fn foreign_delete_leaves_note_and_delete_is_idempotent() {
    let client = client();
    let alice = signed_in(&client, "alice@x.com");
    let mallory = signed_in(&client, "mallory@x.com");
    create(&client, &alice, "mine", "");
    let id = list(&client, &alice).notes[0].id;

    let response = client.delete(format!("/notes/{}", id)).header(bearer(&mallory)).dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(list(&client, &alice).notes.len(), 1);

    for _ in 0..2 {
        let response = client.delete(format!("/notes/{}", id)).header(bearer(&alice)).dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Note deleted successfully");
    }
    assert!(list(&client, &alice).notes.is_empty());
}

#[test]
fn missing_title_is_400() {
    let client = client();
    let token = signed_in(&client, "a@x.com");
    let response = client
        .post("/notes")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(r#"{"description":"no title"}"#)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert!(list(&client, &token).notes.is_empty());
}

#[test]
fn bad_note_id_is_400_but_auth_comes_first() {
    let client = client();
    let token = signed_in(&client, "a@x.com");

    let response = client.delete("/notes/abc").header(bearer(&token)).dispatch();
    assert_eq!(response.status(), Status::BadRequest);

    let response = client.delete("/notes/abc").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn cors_headers_and_preflight() {
    let client = client();
    let response = client.options("/notes/12").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
}

#[test]
fn unknown_route_is_json_404() {
    let client = client();
    let response = client.get("/nowhere").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(
        response.into_json::<ErrorBody>().unwrap().error,
        "No route for GET /nowhere"
    );
}
