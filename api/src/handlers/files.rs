//! File content, glob match and stat handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::auth::UserInfo;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{PathQuery, PatternQuery};
use crate::spaces;
use crate::state::AppState;
use common::wire::{
    FILE_PATH_HEADER, FORCE_HEADER, MatchResponse, SRC_NAME_HEADER, StatInfo, StatResponse,
};

/// Stream a file's bytes with an explicit Content-Length.
pub async fn get_file(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Response> {
    let raw = query.path.trim();
    if raw.is_empty() {
        return Err(ApiError::InvalidPath("path is required".to_string()));
    }
    let (file_path, space) = spaces::resolve(raw, state.spaces())?;
    user.authorize(&space)?;
    let metadata = tokio::fs::metadata(&file_path)
        .await
        .map_err(|err| ApiError::from_io(raw, err))?;
    if metadata.is_dir() {
        return Err(ApiError::IsADirectory(raw.to_string()));
    }
    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|err| ApiError::from_io(raw, err))?;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| ApiError::Internal(err.into()))
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> ApiResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::InvalidPath(format!("{name} header is required")))
}

async fn stat_optional(path: &std::path::Path) -> ApiResult<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ApiError::Internal(err.into())),
    }
}

fn virtual_parent(virtual_path: &str) -> &str {
    virtual_path
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or(virtual_path)
}

/// Create a file from the request body.
///
/// An existing directory destination means "create `<dest>/<basename>`";
/// otherwise the path is used literally and its parent must already exist.
/// Existing files are only replaced when the force header is set.
pub async fn put_new_file(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    req: Request,
) -> ApiResult<StatusCode> {
    let raw = required_header(req.headers(), FILE_PATH_HEADER)?.to_string();
    let src_name = required_header(req.headers(), SRC_NAME_HEADER)?.to_string();
    let force = req
        .headers()
        .get(FORCE_HEADER)
        .and_then(|value| value.to_str().ok())
        == Some("true");
    if src_name.contains('/') || src_name == "." || src_name == ".." {
        return Err(ApiError::InvalidPath(format!(
            "bad source name '{src_name}'"
        )));
    }
    let (mut dest, space) = spaces::resolve(&raw, state.spaces())?;
    user.authorize(&space)?;
    let mut virtual_dest = raw.clone();
    let mut exists = false;
    if let Some(metadata) = stat_optional(&dest).await? {
        if metadata.is_dir() {
            dest.push(&src_name);
            virtual_dest = format!("{}/{}", virtual_dest.trim_end_matches('/'), src_name);
            if let Some(inner) = stat_optional(&dest).await? {
                if inner.is_dir() {
                    return Err(ApiError::IsADirectory(virtual_dest));
                }
                exists = true;
            }
        } else {
            exists = true;
        }
    } else {
        // literal destination: the parent must already exist and be a directory
        let parent = dest
            .parent()
            .ok_or_else(|| ApiError::InvalidPath(format!("path '{virtual_dest}' has no parent")))?;
        match stat_optional(parent).await? {
            None => return Err(ApiError::ParentMissing(virtual_parent(&virtual_dest).to_string())),
            Some(metadata) if !metadata.is_dir() => {
                return Err(ApiError::NotADirectory(
                    virtual_parent(&virtual_dest).to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    if exists && !force {
        return Err(ApiError::AlreadyExists(virtual_dest));
    }
    let mut file = tokio::fs::File::create(&dest)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    let stream = req.into_body().into_data_stream().map_err(std::io::Error::other);
    let mut reader = tokio_util::io::StreamReader::new(stream);
    tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    file.flush()
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Glob match against a space. Directories are dropped from the result and
/// matches are rewritten back into `<space>/<rel>` form. A pattern that
/// matches nothing answers with an explicit NotFound.
pub async fn get_matches(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<PatternQuery>,
) -> ApiResult<Json<MatchResponse>> {
    let raw = query.pattern.trim();
    if raw.is_empty() {
        return Err(ApiError::InvalidPath("pattern is required".to_string()));
    }
    let (pattern_path, space) = spaces::resolve(raw, state.spaces())?;
    user.authorize(&space)?;
    let root = state
        .spaces()
        .get(&space)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("space vanished after resolution")))?;
    let matched = common::fsglob::expand(&pattern_path).await?;
    let mut matches = Vec::new();
    for path in matched {
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| ApiError::Internal(err.into()))?;
        if metadata.is_dir() {
            continue;
        }
        if let Some(virtual_path) = spaces::virtual_from_physical(&space, root, &path) {
            matches.push(virtual_path);
        }
    }
    if matches.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no file matched pattern '{raw}'"
        )));
    }
    Ok(Json(MatchResponse { matches }))
}

/// Stat a file or directory.
pub async fn get_stat(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<StatResponse>> {
    let raw = query.path.trim();
    if raw.is_empty() {
        return Err(ApiError::InvalidPath("path is required".to_string()));
    }
    let (file_path, space) = spaces::resolve(raw, state.spaces())?;
    user.authorize(&space)?;
    let metadata = tokio::fs::metadata(&file_path)
        .await
        .map_err(|err| ApiError::from_io(raw, err))?;
    let name = file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| space.clone());
    Ok(Json(StatResponse {
        stat: StatInfo::from_metadata(name, &metadata),
    }))
}
