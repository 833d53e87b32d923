use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
pub use taskboard_core::User;
use taskboard_core::UserId;

use crate::entities::*;
use crate::web::error::ApiError;

pub mod api;

pub const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}

/// Authentication state containing the user store and the token signing secret.
#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub jwt_secret: String,
}

impl AuthState {
    pub fn new(db: Arc<DatabaseConnection>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,   // Expiry time of the token
    pub iat: usize,   // Issued at time of the token
    pub sub: UserId, // Id of the authenticated user
}

/// Error type for UserService and token operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Name is required")]
    EmptyName,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("A user with email '{0}' is already registered")]
    DuplicateEmail(String),
    /// Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Token operation failed: {0}")]
    Jwt(jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
}

impl UserService<'_> {
    pub fn new(db: &DatabaseConnection) -> UserService<'_> {
        UserService { db }
    }

    /// Registers a new user.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, required.
    /// * `email` - Login email. Stored lowercased and must be unique.
    /// * `password` - Plain password, hashed with Argon2id before storage.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `User` if successful, or an error otherwise.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthServiceError::EmptyName);
        }
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthServiceError::InvalidEmail(email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::PasswordTooShort);
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::DuplicateEmail(email));
        }

        let active_model = user::ActiveModel {
            name: ActiveValue::Set(name.to_string()),
            email: ActiveValue::Set(email.clone()),
            password_hash: ActiveValue::Set(hash_password(password)?),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await.map_err(|err| {
            match err.sql_err() {
                // Lost a race with a concurrent registration.
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AuthServiceError::DuplicateEmail(email.clone())
                }
                _ => AuthServiceError::Database(err),
            }
        })?;
        tracing::info!("Registered user {}", created_model.id);
        Ok(User::from(created_model))
    }

    /// Checks the credentials and returns the matching user.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthServiceError> {
        let email = email.trim().to_lowercase();
        let Some(model) = self.find_by_email(&email).await? else {
            return Err(AuthServiceError::InvalidCredentials);
        };
        if !verify_password(password, &model.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }
        Ok(User::from(model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthServiceError> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?;
        Ok(model)
    }
}

/// Accepts `local@domain.tld` shaped addresses without whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn hash_password(password: &str) -> Result<String, AuthServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthServiceError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthServiceError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|err| AuthServiceError::PasswordHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issues a signed token for the user, valid for 24 hours.
pub fn encode_jwt(user_id: UserId, jwt_secret: &str) -> Result<String, AuthServiceError> {
    let now = Utc::now();
    let expire = chrono::Duration::hours(TOKEN_LIFETIME_HOURS);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        sub: user_id,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(AuthServiceError::Jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AuthServiceError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|_| AuthServiceError::InvalidToken)?;
    Ok(token_data.claims)
}

/// Resolves a bearer token to the id of the user it was issued to.
pub fn authenticate(token: &str, jwt_secret: &str) -> Result<UserId, AuthServiceError> {
    decode_jwt(token, jwt_secret).map(|claims| claims.sub)
}

/// Returns the credentials of a `Bearer` authorization value. The scheme name
/// is matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

/// Extracts the current user from the `Authorization: Bearer` header.
/// Sets the CurrentUser extension if the token is valid; never rejects on its own.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);
    if let Some(token) = token {
        match authenticate(token, &state.jwt_secret) {
            Ok(user_id) => {
                request.extensions_mut().insert(CurrentUser::new(user_id));
            }
            Err(err) => tracing::debug!("Ignoring bearer token: {}", err),
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        return ApiError::Unauthorized(
            "Authentication required to access this resource".to_string(),
        )
        .into_response();
    }

    next.run(request).await
}
