//! Shell-style glob expansion against the filesystem.
//!
//! Patterns are matched one path component at a time, so `*` and `?` never
//! cross a `/` boundary. Character classes are supported. A purely literal
//! expression expands to itself when it exists.

#[derive(Debug, thiserror::Error)]
pub enum GlobError {
    #[error("malformed pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// True when the expression contains a glob metacharacter.
///
/// Only `*` and `?` count here: this drives the "literal expression must
/// match something" policy, and a literal path may legitimately contain
/// brackets.
pub fn is_pattern(expr: &str) -> bool {
    expr.contains(['*', '?'])
}

fn component_has_meta(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Expand `pattern` against the filesystem, returning every existing path
/// that matches, sorted. Directories are not filtered out here; callers
/// decide what to keep.
pub async fn expand(pattern: &std::path::Path) -> Result<Vec<std::path::PathBuf>, GlobError> {
    let mut candidates = vec![std::path::PathBuf::new()];
    for component in pattern.components() {
        match component {
            std::path::Component::RootDir => {
                candidates = vec![std::path::PathBuf::from("/")];
            }
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                for candidate in &mut candidates {
                    candidate.push("..");
                }
            }
            std::path::Component::Prefix(prefix) => {
                candidates = vec![std::path::PathBuf::from(prefix.as_os_str())];
            }
            std::path::Component::Normal(part) => {
                let Some(part) = part.to_str() else {
                    // non-UTF-8 components cannot carry a pattern
                    for candidate in &mut candidates {
                        candidate.push(part);
                    }
                    continue;
                };
                if !component_has_meta(part) {
                    for candidate in &mut candidates {
                        candidate.push(part);
                    }
                    continue;
                }
                let matcher = globset::GlobBuilder::new(part)
                    .literal_separator(true)
                    .build()?
                    .compile_matcher();
                let mut next = Vec::new();
                for candidate in &candidates {
                    let mut entries = match tokio::fs::read_dir(candidate).await {
                        Ok(entries) => entries,
                        Err(_) => continue, // not a directory or gone; no matches here
                    };
                    while let Some(entry) = entries.next_entry().await? {
                        let name = entry.file_name();
                        if let Some(name) = name.to_str() {
                            if matcher.is_match(name) {
                                next.push(candidate.join(name));
                            }
                        }
                    }
                }
                candidates = next;
                if candidates.is_empty() {
                    return Ok(Vec::new());
                }
            }
        }
    }
    let mut matches = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if tokio::fs::symlink_metadata(&candidate).await.is_ok() {
            matches.push(candidate);
        }
    }
    matches.sort();
    Ok(matches)
}
