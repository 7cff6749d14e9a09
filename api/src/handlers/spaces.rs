//! Space discovery handler.

use axum::Json;
use axum::extract::Extension;

use crate::auth::UserInfo;
use common::wire::SpacesResponse;

/// List the spaces the calling user is authorized to access.
pub async fn get_spaces(Extension(user): Extension<UserInfo>) -> Json<SpacesResponse> {
    let mut spaces: Vec<String> = user.spaces.iter().cloned().collect();
    spaces.sort();
    Json(SpacesResponse { spaces })
}
