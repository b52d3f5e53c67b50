//! SeaORM entities for the four tables the backend persists.

pub mod event;
pub mod tag;
pub mod user;
pub mod user_tag;

pub mod prelude {
    pub use super::event::Entity as Event;
    pub use super::tag::Entity as Tag;
    pub use super::user::Entity as User;
    pub use super::user_tag::Entity as UserTag;
}
