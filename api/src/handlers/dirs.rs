//! Directory listing and tree handlers.

use axum::Json;
use axum::extract::{Extension, Query, State};

use crate::auth::UserInfo;
use crate::error::{ApiError, ApiResult};
use crate::handlers::PathQuery;
use crate::spaces;
use crate::state::AppState;
use common::wire::{DirEntry, ListResponse, TreeNode, TreeResponse};

async fn resolve_dir(
    state: &AppState,
    user: &UserInfo,
    raw: &str,
) -> ApiResult<(std::path::PathBuf, String)> {
    if raw.is_empty() {
        return Err(ApiError::InvalidPath("path is required".to_string()));
    }
    let (dir_path, space) = spaces::resolve(raw, state.spaces())?;
    user.authorize(&space)?;
    let metadata = tokio::fs::metadata(&dir_path)
        .await
        .map_err(|err| ApiError::from_io(raw, err))?;
    if !metadata.is_dir() {
        return Err(ApiError::NotADirectory(raw.to_string()));
    }
    Ok((dir_path, space))
}

/// Flat listing of a directory's immediate children.
pub async fn get_list(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<ListResponse>> {
    let raw = query.path.trim();
    let (dir_path, _) = resolve_dir(&state, &user, raw).await?;
    let mut entries = tokio::fs::read_dir(&dir_path)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    let mut children = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|err| ApiError::Internal(err.into()))?;
        children.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: file_type.is_dir(),
        });
    }
    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(ListResponse { children }))
}

/// Recursive tree of a directory, bounded by the configured maximum depth.
/// Node paths are virtual; subtrees below the depth bound are omitted.
pub async fn get_tree(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<TreeResponse>> {
    let raw = query.path.trim();
    let (dir_path, space) = resolve_dir(&state, &user, raw).await?;
    let root = state
        .spaces()
        .get(&space)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("space vanished after resolution")))?;
    let virtual_path = spaces::virtual_from_physical(&space, root, &dir_path)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("resolved path left the space root")))?;
    let mut tree = TreeNode {
        path: virtual_path,
        is_dir: true,
        children: Vec::new(),
    };
    fill_tree(&dir_path, &mut tree, &space, root, state.max_tree_depth()).await?;
    Ok(Json(TreeResponse { tree }))
}

#[async_recursion::async_recursion]
async fn fill_tree(
    dir: &std::path::Path,
    node: &mut TreeNode,
    space: &str,
    root: &std::path::Path,
    depth_left: usize,
) -> ApiResult<()> {
    if depth_left == 0 {
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
    {
        let child_path = entry.path();
        let is_dir = entry
            .file_type()
            .await
            .map_err(|err| ApiError::Internal(err.into()))?
            .is_dir();
        let virtual_path = spaces::virtual_from_physical(space, root, &child_path)
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("entry left the space root")))?;
        let mut child = TreeNode {
            path: virtual_path,
            is_dir,
            children: Vec::new(),
        };
        if is_dir {
            fill_tree(&child_path, &mut child, space, root, depth_left - 1).await?;
        }
        node.children.push(child);
    }
    node.children.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(())
}
