//! Password hashing, admin sessions and the `AdminUser` extractor.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, NaiveDateTime, Utc};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::{AdminSettings, SessionSettings};
use crate::db::{AccountStore, AdminSession, NewAdminSession, NewUser, StoreError, User};
use crate::error::AppError;
use crate::handlers::blocking;
use crate::resources::{Field, FormSchema, Tab};
use crate::state::AppState;
use crate::validation::ValidationErrors;

pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const LOGIN_PATH: &str = "/admin/login";
const COOKIE_PATH: &str = "/admin";
const CSRF_LENGTH: usize = 40;
const REMEMBER_DAYS: i64 = 30;

fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hashes a password into an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The signed-in administrator behind a request.
///
/// Extraction fails with 401 without a live session cookie, and with 419
/// when an unsafe method arrives without the session's CSRF token.
/// Only a successful extraction slides the session's expiry forward.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: User,
    pub session: AdminSession,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let req = req.clone();

        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::Internal("application state missing".to_string()))?;
            let token = req
                .cookie(&state.settings.session.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .ok_or(AppError::Unauthenticated)?;

            let accounts = state.accounts.clone();
            let lifetime = state.settings.session.lifetime_minutes;
            let sent_csrf = (!req.method().is_safe()).then(|| {
                req.headers()
                    .get(CSRF_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            });
            let (method, path) = (req.method().clone(), req.path().to_string());

            let (user, session) = blocking(move || {
                let session = accounts.find_session(&token)?.ok_or(AppError::Unauthenticated)?;
                let now = Utc::now().naive_utc();
                if session.expires_at <= now {
                    accounts.delete_session(&token)?;
                    return Err(AppError::Unauthenticated);
                }
                if sent_csrf.is_some_and(|sent| sent != session.csrf_token) {
                    warn!("CSRF token mismatch for {} {}", method, path);
                    return Err(AppError::CsrfMismatch);
                }
                let user = match accounts.get_user(session.user_id) {
                    Ok(user) => user,
                    Err(StoreError::NotFound) => return Err(AppError::Unauthenticated),
                    Err(other) => return Err(other.into()),
                };
                let expires_at = slide(session.expires_at, now, lifetime);
                accounts.touch_session(&token, expires_at)?;
                Ok((user, AdminSession { expires_at, ..session }))
            })
            .await?;

            Ok(AdminUser { user, session })
        })
    }
}

/// Next expiry for an active session. Remembered sessions already last
/// longer than one lifetime and keep their expiry.
fn slide(current: NaiveDateTime, now: NaiveDateTime, lifetime_minutes: i64) -> NaiveDateTime {
    current.max(now + Duration::minutes(lifetime_minutes))
}

fn session_cookie(settings: &SessionSettings, token: String, max_age: Option<i64>) -> Cookie<'static> {
    let mut cookie = Cookie::build(settings.cookie_name.clone(), token)
        .path(COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .finish();
    if let Some(minutes) = max_age {
        cookie.set_max_age(CookieDuration::minutes(minutes));
    }
    cookie
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub csrf_token: String,
}

pub fn login_form() -> FormSchema {
    FormSchema {
        title: "Connexion",
        tabs: vec![Tab {
            label: "Connexion",
            columns: 1,
            fields: vec![
                Field::text("email").label("Adresse e-mail").required(),
                Field::text("password").label("Mot de passe").required(),
                Field::toggle("remember").label("Se souvenir de moi"),
            ],
        }],
    }
}

pub async fn show_login(current: Option<AdminUser>) -> HttpResponse {
    if current.is_some() {
        return HttpResponse::Found().insert_header(("Location", "/admin")).finish();
    }
    HttpResponse::Ok().json(login_form())
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password, remember } = body.into_inner();

    let mut errors = ValidationErrors::default();
    let email = email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());
    let password = password.filter(|p| !p.is_empty());
    if email.is_none() {
        errors.add("email", "The Adresse e-mail field is required.");
    }
    if password.is_none() {
        errors.add("password", "The Mot de passe field is required.");
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(errors));
    };

    let settings = state.settings.session.clone();
    let lifetime = if remember {
        Duration::days(REMEMBER_DAYS)
    } else {
        Duration::minutes(settings.lifetime_minutes)
    };

    let accounts = state.accounts.clone();
    let attempted = email.clone();
    let signed_in = blocking(move || {
        let purged = accounts.purge_expired_sessions(Utc::now().naive_utc())?;
        if purged > 0 {
            info!("purged {} expired sessions", purged);
        }
        let user = match accounts.find_user_by_email(&email)? {
            Some(user) if verify_password(&password, &user.password_hash) => user,
            _ => return Ok(None),
        };
        let session = accounts.create_session(NewAdminSession {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            csrf_token: random_string(CSRF_LENGTH),
            expires_at: Utc::now().naive_utc() + lifetime,
        })?;
        Ok(Some((user, session)))
    })
    .await?;

    let Some((user, session)) = signed_in else {
        warn!("failed login attempt for {}", attempted);
        let mut errors = ValidationErrors::default();
        errors.add("email", "These credentials do not match our records.");
        return Err(AppError::Validation(errors));
    };

    info!("user {} signed in", user.email);
    let max_age = remember.then(|| lifetime.num_minutes());
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&settings, session.token, max_age))
        .json(LoginResponse {
            user: UserSummary::from(&user),
            csrf_token: session.csrf_token,
        }))
}

pub async fn logout(state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
    let accounts = state.accounts.clone();
    let token = admin.session.token.clone();
    blocking(move || Ok(accounts.delete_session(&token)?)).await?;

    info!("user {} signed out", admin.user.email);
    let mut cookie = session_cookie(&state.settings.session, String::new(), None);
    cookie.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "redirect": LOGIN_PATH })))
}

/// Creates the configured bootstrap administrator unless a user with that
/// email already exists. Returns the created user.
pub fn ensure_bootstrap_admin(accounts: &dyn AccountStore, settings: &AdminSettings) -> Result<Option<User>, AppError> {
    let (Some(email), Some(password)) = (&settings.bootstrap_email, &settings.bootstrap_password) else {
        return Ok(None);
    };
    let email = email.trim().to_lowercase();
    if accounts.find_user_by_email(&email)?.is_some() {
        return Ok(None);
    }
    let user = accounts.create_user(NewUser {
        name: settings.bootstrap_name.clone().unwrap_or_else(|| "Admin".to_string()),
        email,
        password_hash: hash_password(password)?,
    })?;
    info!("created bootstrap admin {}", user.email);
    Ok(Some(user))
}
