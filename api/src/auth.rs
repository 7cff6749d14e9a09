//! Authentication middleware and per-space authorization.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// An authenticated caller and the spaces it may touch.
#[derive(Clone, Debug)]
pub struct UserInfo {
    pub guid: String,
    pub spaces: std::collections::HashSet<String>,
}

impl UserInfo {
    /// Reject access to `space` unless this user is allowed to touch it.
    ///
    /// Runs after path resolution and before any filesystem access, so the
    /// failure does not reveal whether the target exists.
    pub fn authorize(&self, space: &str) -> ApiResult<()> {
        if self.spaces.contains(space) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(
                "unauthorized to access space".to_string(),
            ))
        }
    }
}

fn extract_credential(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.split_once(' ')?;
    if scheme != common::wire::AUTH_SCHEME {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

/// Resolve the caller's credential before any handler logic runs.
///
/// Absent, malformed and unknown credentials all produce the same response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(credential) = extract_credential(&req) else {
        return Err(ApiError::Unauthorized("bad authentication".to_string()));
    };
    let Some(user) = state.users().get(credential) else {
        return Err(ApiError::Unauthorized("bad authentication".to_string()));
    };
    req.extensions_mut().insert(user.clone());
    Ok(next.run(req).await)
}
