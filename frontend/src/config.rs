/// Backend base URL, fixed at build time through `NOTES_API_URL`.
pub const API_URL: &str = match option_env!("NOTES_API_URL") {
    Some(url) => url,
    None => "http://localhost:3002",
};

/// Local storage key holding the signed-in session.
pub const SESSION_KEY: &str = "yew.noteapp.session";
