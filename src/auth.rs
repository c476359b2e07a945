// auth.rs - Credential check and signed session tokens for the dashboard
// Credentials come from config.yaml; sessions are HS256 JWTs signed with
// cookie.key and carried either as a Bearer token or in the session cookie.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::{AppConfig, UserEntry};

/// Identity the adapter receives with every invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub login: Option<String>,
    pub display_name: String,
    pub authenticated: bool,
}

impl Session {
    pub fn authenticated(login: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            login: Some(login.into()),
            display_name: display_name.into(),
            authenticated: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            login: None,
            display_name: String::new(),
            authenticated: false,
        }
    }

    /// Operator at the terminal in one-shot CLI mode
    pub fn local_operator() -> Self {
        let login = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "operator".to_string());
        Self::authenticated(login.clone(), login)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter your username and password")]
    MissingCredentials,
    #[error("Username/password is incorrect")]
    InvalidCredentials,
    #[error("Invalid or expired session")]
    InvalidToken,
    #[error("Failed to generate token")]
    TokenGeneration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    exp: usize,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session: Session,
}

#[derive(Clone)]
pub struct Authenticator {
    users: BTreeMap<String, UserEntry>,
    key: String,
    cookie_name: String,
    expiry_days: u32,
}

impl Authenticator {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            users: config.credentials.usernames.clone(),
            key: config.cookie.key.clone(),
            cookie_name: config.cookie.name.clone(),
            expiry_days: config.cookie.expiry_days.max(1),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self.users.get(username).ok_or(AuthError::InvalidCredentials)?;
        match bcrypt::verify(password, &user.password) {
            Ok(true) => {}
            _ => return Err(AuthError::InvalidCredentials),
        }

        let expiration = chrono::Utc::now()
            .checked_add_signed(chrono::Duration::days(self.expiry_days as i64))
            .ok_or(AuthError::TokenGeneration)?
            .timestamp();

        let claims = Claims {
            sub: username.to_string(),
            name: user.name.clone(),
            exp: expiration as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.key.as_ref()),
        )
        .map_err(|_| AuthError::TokenGeneration)?;

        Ok(IssuedToken {
            token,
            session: Session::authenticated(username, user.name.clone()),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.key.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        // Users removed from config.yaml lose their sessions
        let user = self
            .users
            .get(&data.claims.sub)
            .ok_or(AuthError::InvalidToken)?;

        Ok(Session::authenticated(data.claims.sub, user.name.clone()))
    }

    /// Session from `Authorization: Bearer` or the session cookie; anonymous otherwise
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Session {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = bearer.or_else(|| self.cookie_token(headers));

        token
            .and_then(|t| self.verify(&t).ok())
            .unwrap_or_else(Session::anonymous)
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
    }

    pub fn set_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            self.cookie_name,
            token,
            self.expiry_days as u64 * 86_400
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", self.cookie_name)
    }
}
