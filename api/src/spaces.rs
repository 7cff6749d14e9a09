//! Space resolution: virtual `<space>/<subpath>` strings to physical paths.

use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};

/// Split a virtual path into its space name and subpath. The subpath may be
/// empty ("docs" addresses the space root).
pub fn split_virtual_path(raw: &str) -> ApiResult<(&str, &str)> {
    let (space, sub) = match raw.split_once('/') {
        Some((space, sub)) => (space, sub),
        None => (raw, ""),
    };
    if space.is_empty() {
        return Err(ApiError::InvalidPath("space name is empty".to_string()));
    }
    Ok((space, sub))
}

/// Lexically collapse `.`/`..` segments, rejecting any `..` that would
/// climb above the space root.
fn normalize_subpath(raw: &str, sub: &str) -> ApiResult<std::path::PathBuf> {
    let mut normalized = std::path::PathBuf::new();
    for component in std::path::Path::new(sub).components() {
        match component {
            std::path::Component::Normal(part) => normalized.push(part),
            std::path::Component::CurDir | std::path::Component::RootDir => {}
            std::path::Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ApiError::InvalidPath(format!(
                        "path '{raw}' escapes its space root"
                    )));
                }
            }
            std::path::Component::Prefix(_) => {
                return Err(ApiError::InvalidPath(format!("path '{raw}' is not relative")));
            }
        }
    }
    Ok(normalized)
}

/// Resolve a virtual path to `(physical_path, space_name)`.
///
/// The result is guaranteed to stay under the space root: `..` segments
/// that would escape are rejected during normalization, and the joined
/// path is checked for the root prefix again before it is returned.
pub fn resolve(
    raw: &str,
    spaces: &HashMap<String, std::path::PathBuf>,
) -> ApiResult<(std::path::PathBuf, String)> {
    let (space, sub) = split_virtual_path(raw)?;
    let root = spaces
        .get(space)
        .ok_or_else(|| ApiError::UnknownSpace(space.to_string()))?;
    let normalized = normalize_subpath(raw, sub)?;
    let resolved = if normalized.as_os_str().is_empty() {
        root.clone()
    } else {
        root.join(normalized)
    };
    if !resolved.starts_with(root) {
        return Err(ApiError::InvalidPath(format!(
            "path '{raw}' escapes its space root"
        )));
    }
    Ok((resolved, space.to_string()))
}

/// Rewrite a physical path under `root` back into `<space>/<rel>` form.
pub fn virtual_from_physical(
    space: &str,
    root: &std::path::Path,
    physical: &std::path::Path,
) -> Option<String> {
    let rel = physical.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        Some(space.to_string())
    } else {
        Some(format!("{space}/{}", rel.display()))
    }
}
