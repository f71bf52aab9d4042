// Email/password accounts on top of the document store

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::session::{Session, SessionHandle};
use crate::infrastructure::traits::DocumentStore;
use crate::models::{UserCredentials, UserDocument};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.]{3,32}$").expect("username pattern is valid"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: String,
}

pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle, bcrypt_cost: u32) -> Self {
        Self {
            store,
            session,
            bcrypt_cost,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Registers the account, creates its user document and signs it in.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUp) -> AppResult<Session> {
        let email = normalize_email(&request.email);
        let username = normalize_username(&request.username);
        validate_sign_up(&email, &request.password, &username)?;

        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("username is already taken".to_string()));
        }
        if self.store.find_credentials_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let password_hash = hash_password(request.password, self.bcrypt_cost).await?;
        let uid = UserId::generate();
        let doc = UserDocument {
            uid: uid.clone(),
            username,
            full_name: request.full_name.trim().to_string(),
            friends: Vec::new(),
            created_at: Utc::now(),
        };
        let credentials = UserCredentials {
            uid: uid.clone(),
            email: email.clone(),
            password_hash,
        };
        self.store.create_user(&doc, &credentials).await?;

        let session = Session::new(uid, email);
        self.session.replace(session.clone()).await;
        info!("Signed up {}", session.uid);
        Ok(session)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        let credentials = match self.store.find_credentials_by_email(&email).await? {
            Some(credentials) => credentials,
            None => return Err(wrong_credentials()),
        };

        if !verify_password(password.to_string(), credentials.password_hash).await? {
            warn!("Failed sign in for {}", credentials.uid);
            return Err(wrong_credentials());
        }

        let session = Session::new(credentials.uid, email);
        self.session.replace(session.clone()).await;
        info!("Signed in {}", session.uid);
        Ok(session)
    }

    pub async fn sign_out(&self) {
        if let Some(session) = self.session.clear().await {
            info!("Signed out {}", session.uid);
        }
    }
}

fn wrong_credentials() -> AppError {
    AppError::Unauthorized("wrong email or password".to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Usernames are stored trimmed and lowercased; lookups must go through this too.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

fn validate_sign_up(email: &str, password: &str, username: &str) -> AppResult<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "username must be 3-32 characters of a-z, 0-9, '_' or '.'".to_string(),
        ));
    }
    Ok(())
}

// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("verify failed: {}", e)))
}
