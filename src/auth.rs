//! Admin authentication: password login and HS256 bearer tokens.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web::Data, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    db,
    errors::AppError,
    structs::{AdminSummary, LoginResponse},
    utils::verify_password,
    AppState,
};

/// How long an issued token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, admin_id: i64, username: &str) -> Result<String, AppError> {
        self.issue_at(admin_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        admin_id: i64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: admin_id.to_string(),
            username: username.to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Returns the admin id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        // expiry is checked below against `now` instead of the system clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            log::debug!("Rejected admin token: {}", e);
            AppError::Unauthenticated
        })?;
        if now.timestamp() >= data.claims.exp {
            log::debug!("Rejected expired admin token for {}", data.claims.username);
            return Err(AppError::Unauthenticated);
        }
        data.claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthenticated)
    }
}

/// Verifies admin credentials and issues a token.
///
/// Unknown usernames and wrong passwords fail with the same error so callers
/// cannot tell which admins exist.
pub async fn login(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<LoginResponse, AppError> {
    let admin = match db::find_admin_by_username(&state.db_pool, username).await? {
        Some(admin) => admin,
        None => {
            log::warn!("Login attempt for unknown admin");
            return Err(AppError::InvalidCredentials);
        }
    };
    // argon2 verification blocks, so run it off the worker thread
    let stored_hash = admin.password_hash.clone();
    let provided = password.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify_password(&provided, &stored_hash))
        .await
        .map_err(|e| {
            log::error!("Password verification task failed: {}", e);
            AppError::InternalServerError
        })?;
    if !valid {
        log::warn!("Failed login for admin {}", admin.id);
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(admin.id, &admin.username)?;
    log::info!("Admin {} logged in", admin.id);
    Ok(LoginResponse {
        token,
        admin: AdminSummary {
            id: admin.id,
            username: admin.username,
        },
    })
}

/// Extractor for routes that require a valid admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAdmin {
    pub id: i64,
}

impl AuthenticatedAdmin {
    fn from_http_request(req: &HttpRequest) -> Result<Self, AppError> {
        let state = req.app_data::<Data<AppState>>().ok_or_else(|| {
            log::error!("AppState is not registered with the application");
            AppError::InternalServerError
        })?;
        let token = bearer_token(req).ok_or(AppError::Unauthenticated)?;
        let id = state.tokens.verify(token)?;
        Ok(Self { id })
    }
}

impl FromRequest for AuthenticatedAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

// the auth scheme is case-insensitive
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
