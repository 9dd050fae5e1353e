use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use quill_db::Database;
use quill_db::models::UserRow;
use quill_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use quill_types::models::Role;

use crate::error::{ApiError, field};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    if req.username.len() < 3 || req.username.len() > 32 {
        errors.push(field("username", "username must be 3-32 characters"));
    }
    if !req.email.contains('@') {
        errors.push(field("email", "a valid email is required"));
    }
    if req.password.len() < 8 {
        errors.push(field("password", "password must be at least 8 characters"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Hash password with Argon2id; plaintext is never stored.
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    let user = UserRow {
        id: user_id.to_string(),
        username: req.username.clone(),
        email: req.email.clone(),
        password: password_hash,
        role: Role::User.as_str().to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    // Duplicate username/email surfaces from the unique indexes as Conflict.
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.create_user(&user).map_err(ApiError::from))
        .await??;

    let token = create_token(&state.jwt_secret, user_id, &req.username, Role::User)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email).map_err(ApiError::from))
        .await??
        .ok_or(ApiError::Unauthenticated)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;
    let role = Role::parse(&user.role).unwrap_or(Role::User);

    let token = create_token(&state.jwt_secret, user_id, &user.username, role)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
    }))
}

/// Seed an admin account on first startup so a fresh deployment can
/// manage content. No-op once any admin exists.
pub fn ensure_admin(db: &Database) -> anyhow::Result<()> {
    if db.has_admin()? {
        return Ok(());
    }

    let username =
        std::env::var("QUILL_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let email =
        std::env::var("QUILL_ADMIN_EMAIL").unwrap_or_else(|_| "admin@quill.local".into());
    let password =
        std::env::var("QUILL_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash failed: {}", e))?
        .to_string();

    db.create_user(&UserRow {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        email: email.clone(),
        password: password_hash,
        role: Role::Admin.as_str().to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    })?;

    info!("Seeded admin account '{}' ({})", username, email);
    Ok(())
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    role: Role,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}
