//! Authorization rules shared by the entity services.
//!
//! Each rule is a pure function of the actor and the resource owner. Services
//! run them before any mutation; a denial always surfaces as `Forbidden`, never
//! as `NotFound`.

use uuid::Uuid;

use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Events: the host or any superuser.
pub fn owner_or_superuser(actor: &AuthenticatedUser, host_id: Uuid) -> Decision {
    Decision::from_bool(actor.is_superuser || actor.id == host_id)
}

/// Tag mutation: superusers only.
pub fn superuser_only(actor: &AuthenticatedUser) -> Decision {
    Decision::from_bool(actor.is_superuser)
}

/// Reading a user's tags: the user themselves or any superuser.
pub fn self_or_superuser(actor: &AuthenticatedUser, target_user_id: Uuid) -> Decision {
    Decision::from_bool(actor.is_superuser || actor.id == target_user_id)
}

pub fn ensure(decision: Decision) -> Result<(), AppError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AppError::forbidden()),
    }
}
