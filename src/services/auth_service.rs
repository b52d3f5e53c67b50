use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::UserService;
use crate::web::error::AppError;
use crate::web::models::user_models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, UserPublic};
use crate::web::models::{AuthenticatedUser, Claims};

const MIN_PASSWORD_LENGTH: usize = 8;
const TOKEN_LIFETIME_HOURS: i64 = 24;

pub async fn register_user(users: &UserService, req: RegisterRequest) -> Result<UserPublic, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Email must not be empty and the password needs at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    let user = users
        .create(NewUser {
            email: email.to_string(),
            password: req.password,
            full_name: req.full_name,
            is_superuser: false,
            is_active: true,
        })
        .await?;
    Ok(user.into())
}

pub async fn login_user(users: &UserService, req: LoginRequest, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password must not be empty.".to_string()));
    }

    let Some(user) = users.authenticate(&req.email, &req.password).await? else {
        warn!(email = %req.email, "Failed login attempt.");
        return Err(AppError::InvalidCredentials);
    };
    if !user.is_active {
        return Err(AppError::InvalidInput("Inactive user".to_string()));
    }

    info!(user_id = %user.id, "User logged in.");
    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        token_type: "bearer".to_string(),
        user_id: user.id,
        email: user.email.clone(),
    })
}

pub async fn me(users: &UserService, actor: &AuthenticatedUser) -> Result<UserPublic, AppError> {
    users
        .get_by_id(actor.id)
        .await?
        .map(UserPublic::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TEST_HASH_COST, setup_db};
    use jsonwebtoken::{DecodingKey, Validation, decode};

    const SECRET: &str = "test-secret";

    async fn users() -> UserService {
        UserService::new(setup_db().await).with_hash_cost(TEST_HASH_COST)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login_issues_token() {
        let users = users().await;
        let registered = register_user(&users, register_request("ada@example.com", "password123"))
            .await
            .unwrap();
        assert!(!registered.is_superuser);

        let login = login_user(
            &users,
            LoginRequest {
                email: "ada@example.com".to_string(),
                password: "password123".to_string(),
            },
            SECRET,
        )
        .await
        .unwrap();

        let decoded = decode::<Claims>(
            &login.token,
            &DecodingKey::from_secret(SECRET.as_ref()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id, registered.id);
        assert_eq!(decoded.claims.sub, "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let users = users().await;
        let err = register_user(&users, register_request("ada@example.com", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let users = users().await;
        register_user(&users, register_request("ada@example.com", "password123"))
            .await
            .unwrap();

        let err = login_user(
            &users,
            LoginRequest {
                email: "ada@example.com".to_string(),
                password: "password124".to_string(),
            },
            SECRET,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
