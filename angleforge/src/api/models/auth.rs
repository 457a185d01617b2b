//! API request/response models for signup, login and logout.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{PlanName, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupBody {
    pub message: String,
    pub user: SignupUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub plan: PlanName,
    pub is_admin: bool,
}

/// Login result. `token` duplicates the session cookie for clients using bearer auth.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginBody {
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutBody {
    pub message: String,
}

fn with_cookie(status: StatusCode, cookie: HeaderValue, body: impl Serialize) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    (status, headers, Json(body)).into_response()
}

/// Successful signup: 201 plus the session cookie
pub struct SignupResponse {
    pub body: SignupBody,
    pub cookie: HeaderValue,
}

impl IntoResponse for SignupResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::CREATED, self.cookie, self.body)
    }
}

pub struct LoginResponse {
    pub body: LoginBody,
    pub cookie: HeaderValue,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, self.cookie, self.body)
    }
}

pub struct LogoutResponse {
    pub body: LogoutBody,
    pub cookie: HeaderValue,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, self.cookie, self.body)
    }
}
