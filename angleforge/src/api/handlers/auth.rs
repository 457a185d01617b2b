use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{LoginBody, LoginRequest, LoginResponse, LogoutBody, LogoutResponse, SessionUser, SignupBody, SignupRequest, SignupResponse, SignupUser},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    db::{
        errors::USERS_EMAIL_UNIQUE,
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    types::PlanName,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const DUPLICATE_EMAIL: &str = "User with this email already exists";

/// An address with a non-empty local part and a dotted domain.
pub(crate) fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Create an account on the Free plan
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User created", body = SignupBody),
        (status = 400, description = "Invalid input or email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<SignupResponse, Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let email = request.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }
    password::validate_password(&request.password, &state.config.auth.password)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    if users.get_user_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: DUPLICATE_EMAIL.to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created = users
        .create(&UserCreateDBRequest {
            email,
            password_hash: Some(password_hash),
            plan: PlanName::Free,
            is_admin: false,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent signup for the same address
            e if e.is_unique_violation_on(USERS_EMAIL_UNIQUE) => Error::BadRequest {
                message: DUPLICATE_EMAIL.to_string(),
            },
            other => other.into(),
        })?;

    tracing::info!("Created user {}", created.id);

    let current_user = CurrentUser::from(created);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config)?;

    Ok(SignupResponse {
        body: SignupBody {
            message: "User created successfully".to_string(),
            user: SignupUser {
                id: current_user.id,
                email: current_user.email,
            },
        },
        cookie,
    })
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = LoginBody),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let invalid = || Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.clone().ok_or_else(invalid)?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid());
    }

    let current_user = CurrentUser::from(user);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config)?;

    Ok(LoginResponse {
        body: LoginBody {
            user: SessionUser {
                id: current_user.id,
                email: current_user.email,
                plan: current_user.plan,
                is_admin: current_user.is_admin,
            },
            token,
        },
        cookie,
    })
}

/// Log out (clear the session cookie)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = LogoutBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        body: LogoutBody {
            message: "Logout successful".to_string(),
        },
        cookie: session::clear_session_cookie(&state.config),
    }
}

/// The current session user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::Unauthenticated { message: None })?;

    Ok(Json(UserResponse::from(user)))
}
