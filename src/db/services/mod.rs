//! The `services` module provides a high-level API for interacting with the database.
//! Each service owns a shared connection handle and runs every operation in a single
//! transaction, so handlers work with domain models and never with queries.

pub mod event_service;
pub mod tag_service;
pub mod user_service;
pub mod user_tag_service;

pub use event_service::EventService;
pub use tag_service::TagService;
pub use user_service::UserService;
pub use user_tag_service::UserTagService;
