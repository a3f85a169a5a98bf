//! Client side of the notes app. Everything here is plain state and request
//! plumbing, the Yew component in `main.rs` drives it.

pub mod api;
pub mod config;
pub mod session;
pub mod structs;
pub mod view_model;
