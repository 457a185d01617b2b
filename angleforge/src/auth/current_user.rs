use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
    },
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    /// Resolve the caller from the session cookie or a bearer token.
    ///
    /// The token only proves identity; the user row is reloaded so plan changes and deletions take
    /// effect immediately.
    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = session::token_from_headers(&parts.headers, &state.config) else {
            trace!("No authentication credentials found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        let claims = session::verify_session_token(token, &state.config)?;

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let user = Users::new(&mut conn).get_by_id(claims.sub).await?.ok_or_else(|| {
            debug!("Session token refers to a user that no longer exists: {}", claims.sub);
            Error::Unauthenticated { message: None }
        })?;

        debug!("Authenticated user {}", user.id);
        Ok(CurrentUser::from(user))
    }
}

/// Reject callers that are not administrators.
pub fn require_admin(user: &CurrentUser) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: "Administrator access required".to_string(),
        })
    }
}

/// Reject callers that are not on the Pro plan.
pub fn require_pro(user: &CurrentUser, feature: &str) -> Result<()> {
    if user.is_pro() {
        Ok(())
    } else {
        Err(Error::PlanRequired {
            feature: feature.to_string(),
        })
    }
}
