//! Backend of the notes app: account registration and login, plus CRUD on
//! notes that only their owner can see or touch.
//!
//! Accounts and notes sit behind two adapters, [`identity::IdentityProvider`]
//! and [`store::NoteStore`]. [`service::NotesService`] does the work and
//! [`routes`] puts it on HTTP.

#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::{Build, Rocket};
use tracing::info;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod memory;
pub mod routes;
pub mod service;
pub mod store;
pub mod structs;

use config::Config;
use identity::SqliteIdentityProvider;
use memory::{MemoryIdentityProvider, MemoryNoteStore};
use service::NotesService;
use store::SqliteNoteStore;

/// Wire the adapters selected by `config` into a service.
pub async fn service_from_config(config: &Config) -> anyhow::Result<NotesService> {
    if config.uses_memory() {
        info!("using in-memory accounts and notes");
        return Ok(NotesService::new(
            Arc::new(MemoryIdentityProvider::new(config.token_ttl)),
            Arc::new(MemoryNoteStore::new()),
        ));
    }

    let pool = db::connect(&config.database_url).await?;
    db::init_schema(&pool).await?;
    info!(database = %config.database_url, "database ready");

    Ok(NotesService::new(
        Arc::new(SqliteIdentityProvider::new(pool.clone(), config.token_ttl)),
        Arc::new(SqliteNoteStore::new(pool)),
    ))
}

pub fn build_rocket(service: NotesService, config: &Config) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", config.port));

    rocket::custom(figment)
        .attach(routes::Cors::new(config.allowed_origin.clone()))
        .manage(service)
        .mount("/", routes::routes())
        .register("/", routes::catchers())
}
