use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::{Catcher, Request, Response, Route, State};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::service::NotesService;
use crate::structs::{
    ErrorBody, LoginBody, LoginResponse, NoteBody, NoteResponse, NotesResponse, RegisterBody, RegisterResponse,
    SuccessResponse,
};

pub struct Cors {
    allowed_origin: String,
}

impl Cors {
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", self.allowed_origin.clone()));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Authorization, Content-Type",
        ));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

pub fn routes() -> Vec<Route> {
    routes![
        register,
        login,
        create_note,
        list_notes,
        update_note,
        delete_note,
        handle_options
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![not_found, unprocessable, internal_error, default_catcher]
}

fn json_body<T>(body: Result<Json<T>, json::Error<'_>>) -> ApiResult<T> {
    body.map(Json::into_inner)
        .map_err(|e| ApiError::Validation(format!("Malformed request body: {}", e)))
}

fn note_id(id: Result<i64, &str>) -> ApiResult<i64> {
    id.map_err(|raw| ApiError::Validation(format!("Invalid note id: {}", raw)))
}

// Routes //////////////////////////////////////////////////////////////////////////////////////////

#[post("/register", data = "<body>")]
async fn register(
    service: &State<NotesService>,
    body: Result<Json<RegisterBody>, json::Error<'_>>,
) -> ApiResult<status::Custom<Json<RegisterResponse>>> {
    let body = json_body(body)?;
    let user = service
        .register(&body.email, &body.password, body.name.as_deref().unwrap_or_default())
        .await?;

    Ok(status::Custom(
        Status::Created,
        Json(RegisterResponse {
            message: "User registered".into(),
            user,
        }),
    ))
}

#[post("/login", data = "<body>")]
async fn login(
    service: &State<NotesService>,
    body: Result<Json<LoginBody>, json::Error<'_>>,
) -> ApiResult<Json<LoginResponse>> {
    let body = json_body(body).map_err(|_| ApiError::from(AuthFailure::BadCredentials))?;
    let (user, token) = service.login(&body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        message: "Successfully Logged In".into(),
        user,
        token,
    }))
}

#[post("/notes", data = "<body>")]
async fn create_note(
    service: &State<NotesService>,
    caller: Result<Caller, ApiError>,
    body: Result<Json<NoteBody>, json::Error<'_>>,
) -> ApiResult<Json<SuccessResponse>> {
    let Caller(identity) = caller?;
    let draft = json_body(body)?.into_draft()?;
    service.create_note(&identity, draft).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: None,
    }))
}

#[get("/notes")]
async fn list_notes(
    service: &State<NotesService>,
    caller: Result<Caller, ApiError>,
) -> ApiResult<Json<NotesResponse>> {
    let Caller(identity) = caller?;
    let notes = service.list_notes(&identity).await?;

    Ok(Json(NotesResponse { notes }))
}

#[put("/notes/<id>", data = "<body>")]
async fn update_note(
    service: &State<NotesService>,
    caller: Result<Caller, ApiError>,
    id: Result<i64, &str>,
    body: Result<Json<NoteBody>, json::Error<'_>>,
) -> ApiResult<Json<NoteResponse>> {
    let Caller(identity) = caller?;
    let id = note_id(id)?;
    let draft = json_body(body)?.into_draft()?;
    let note = service.update_note(&identity, id, draft).await?;

    Ok(Json(NoteResponse { success: true, note }))
}

#[delete("/notes/<id>")]
async fn delete_note(
    service: &State<NotesService>,
    caller: Result<Caller, ApiError>,
    id: Result<i64, &str>,
) -> ApiResult<Json<SuccessResponse>> {
    let Caller(identity) = caller?;
    let id = note_id(id)?;
    service.delete_note(&identity, id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: Some("Note deleted successfully".into()),
    }))
}

// Important for handling CORS preflight
#[options("/<_..>")]
async fn handle_options() -> Status {
    Status::Ok
}

// Catchers ////////////////////////////////////////////////////////////////////////////////////////

fn error_body(message: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: message.into(),
    })
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorBody> {
    error_body(format!("No route for {} {}", req.method(), req.uri().path()))
}

#[catch(422)]
fn unprocessable() -> Json<ErrorBody> {
    error_body("Malformed request body")
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    error_body("Internal server error")
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> status::Custom<Json<ErrorBody>> {
    status::Custom(status, error_body(status.reason_lossy()))
}
