use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, validate_password, verify_password, TokenService};
use crate::database::error::DatabaseError;
use crate::database::repository::UserStore;
use crate::error::{AppError, AppResult};
use crate::models::user::normalize_email;
use crate::models::{PublicUser, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Customer registration and login
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(AppError::validation("A valid email address is required"));
        }
        if request.name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        validate_password(&request.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration attempted for existing email {}", email);
            return Err(DatabaseError::duplicate("email", email).into());
        }

        let user = User::new(&email, request.name.trim(), hash_password(&request.password)?);
        self.users.insert(&user).await?;
        info!("Registered user {}", user.id);

        Ok(AuthResponse {
            token: self.tokens.issue(&user)?,
            user: user.public(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => {
                warn!("Failed login for {}", email);
                return Err(AppError::unauthorized("Invalid email or password"));
            }
        };

        info!("User {} logged in", user.id);
        Ok(AuthResponse {
            token: self.tokens.issue(&user)?,
            user: user.public(),
        })
    }

    /// Resolves the user behind a verified token
    pub async fn current_user(&self, user_id: &str) -> AppResult<PublicUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.public())
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))
    }
}
