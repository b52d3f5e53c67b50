pub mod event_routes;
pub mod tag_routes;
pub mod user_routes;
