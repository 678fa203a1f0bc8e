//! # Lead Service Module
//!
//! Routes under `/leads`. Every operation requires an authenticated caller; leads
//! themselves carry no owner, so any caller may read and change any lead.
//!
//! ## Registered Routes
//!
//! - `POST /leads` (`create`): validates the payload, assigns `id`, `createdAt` and
//!   `updatedAt`, stores the lead and answers `201` with it.
//! - `GET /leads` (`list`): filtered, paginated listing. See `list::LEAD_LISTING`.
//! - `GET /leads/{id}` (`get`): the lead, or `404`.
//! - `PUT /leads/{id}` (`update`): partial update of an existing lead.
//! - `DELETE /leads/{id}` (`delete`): removes an existing lead, answering `204`.

mod create;
mod delete;
mod get;
mod list;
mod update;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/leads";

pub(crate) const NOT_FOUND: &str = "Lead not found";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{id}", get().to(get::process))
        .route("/{id}", put().to(update::process))
        .route("/{id}", delete().to(delete::process))
}
