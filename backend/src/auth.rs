use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use crate::error::ApiError;
use crate::service::NotesService;
use crate::structs::Identity;

/// The verified identity behind a request's bearer token.
///
/// Take it as `Result<Caller, ApiError>` so a rejected token reaches the
/// handler and is answered with a JSON body instead of the 401 catcher.
#[derive(Debug)]
pub struct Caller(pub Identity);

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let service = match req.guard::<&State<NotesService>>().await {
            Outcome::Success(service) => service,
            _ => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::Storage("Notes service is not configured".into()),
                ))
            }
        };

        let token = req.headers().get_one("Authorization").and_then(bearer_token);
        match service.authenticate(token).await {
            Ok(identity) => Outcome::Success(Caller(identity)),
            Err(e) => Outcome::Error((e.status(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
