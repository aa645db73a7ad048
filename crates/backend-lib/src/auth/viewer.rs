//! Axum extractor for the authenticated viewer.
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::UserProfile;
use crate::{error::AppError, validation, AppState};

/// Header set by the upstream auth middleware
pub const USER_ID_HEADER: &str = "x-user-id";

/// The account making the request
#[derive(Debug, Clone)]
pub struct Viewer(pub UserProfile);

impl Viewer {
    pub fn id(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Auth("missing viewer identity".to_string()))?;

        validation::validate_user_id(user_id)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let profile = state
            .directory
            .lookup(user_id)
            .await
            .ok_or_else(|| AppError::Auth(format!("unknown user {user_id}")))?;

        Ok(Viewer(profile))
    }
}
