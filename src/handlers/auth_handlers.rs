use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, info, instrument, warn};

use crate::auth::{self, AuthUser, LoginCredentials};
use crate::dto::{AuthRequest, AuthResponse, MeResponse};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::AppState;

/// Runs a CPU-heavy password operation off the async runtime
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|err| ApiError::Internal(format!("Password task failed: {}", err)))
}

fn issue_token(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let token = auth::create_token(&user.get_id(), state.jwt_secret(), state.config.token_ttl())?;
    Ok(AuthResponse {
        email: user.get_email(),
        id: user.get_id(),
        token,
    })
}

/// Handler for registering a new account
///
/// This function handles POST requests to `/api/signup`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payload` - JSON body with the email and password
///
/// ### Returns
///
/// The new user's id and email together with a bearer token
///
/// ### Errors
///
/// 400 when the email is malformed or already registered, or the password
/// is empty
#[instrument(skip(state, payload))]
pub async fn signup_handler(
    // Extract the application state
    State(state): State<AppState>,
    // Extract and deserialize the JSON request body
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let email = payload.email.trim().to_lowercase();

    info!("Signing up {}", email);

    if !auth::validate_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }

    if repo::get_user_by_email(&state.pool, &email)
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password = payload.password;
    let password_hash = blocking(move || auth::hash_password(&password)).await??;

    let user = match repo::create_user(&state.pool, email, password_hash).await {
        Ok(user) => user,
        // lost a race with a concurrent signup for the same email
        Err(err) if repo::is_unique_violation(&err) => {
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }
        Err(err) => return Err(ApiError::Database(err)),
    };

    info!("Created user {}", user.get_id());

    Ok(Json(issue_token(&state, &user)?))
}

/// Handler for logging in
///
/// This function handles POST requests to `/api/login`. The body can be JSON
/// or the OAuth2 password form, see [`LoginCredentials`].
///
/// ### Returns
///
/// The user's id and email together with a fresh bearer token
///
/// ### Errors
///
/// 401 `Invalid email or password` for an unknown email or a wrong password
#[instrument(skip(state, credentials))]
pub async fn login_handler(
    State(state): State<AppState>,
    credentials: LoginCredentials,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = credentials.email.trim().to_lowercase();
    let rejected = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = repo::get_user_by_email(&state.pool, &email).map_err(ApiError::Database)? else {
        debug!("Login for unknown email");
        return Err(rejected());
    };

    let hash = user.get_password_hash().to_string();
    let password = credentials.password;
    if !blocking(move || auth::verify_password(&hash, &password)).await? {
        warn!("Wrong password for user {}", user.get_id());
        return Err(rejected());
    }

    info!("User {} logged in", user.get_id());

    Ok(Json(issue_token(&state, &user)?))
}

/// Handler for `GET /api/me`
#[instrument(skip(auth_user))]
pub async fn me_handler(auth_user: AuthUser) -> Json<MeResponse> {
    let user = auth_user.user;
    Json(MeResponse {
        id: user.get_id(),
        email: user.get_email(),
        username: user.get_username(),
        created_at: user.get_created_at(),
    })
}
