//! Wire types shared between the transfer API server and its client.
//!
//! Success responses carry a typed JSON payload; errors carry a
//! `code` + `message` body. File content is a raw byte stream with an
//! explicit `Content-Length`, never JSON-enveloped.

/// Header carrying the destination virtual path on file uploads.
pub const FILE_PATH_HEADER: &str = "x-file-path";
/// Header carrying the source file basename on file uploads.
pub const SRC_NAME_HEADER: &str = "x-src-name";
/// Header carrying the overwrite flag on file uploads ("true"/"false").
pub const FORCE_HEADER: &str = "x-force";
/// Authorization scheme expected by the server: `simple <credential>`.
pub const AUTH_SCHEME: &str = "simple";

/// Machine-readable error codes carried in every non-success response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPath,
    UnknownSpace,
    Unauthorized,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    ParentMissing,
    InvalidPattern,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPath => "invalid_path",
            ErrorCode::UnknownSpace => "unknown_space",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::NotFound => "not_found",
            ErrorCode::NotADirectory => "not_a_directory",
            ErrorCode::IsADirectory => "is_a_directory",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::ParentMissing => "parent_missing",
            ErrorCode::InvalidPattern => "invalid_pattern",
            ErrorCode::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of every non-2xx response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// One immediate child of a listed directory.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A node in a directory tree. Paths are virtual (`<space>/<rel>`), never
/// physical server paths.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub path: String,
    pub is_dir: bool,
    pub children: Vec<TreeNode>,
}

/// Uniform stat result for files and directories.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: chrono::DateTime<chrono::Utc>,
}

impl StatInfo {
    pub fn from_metadata(name: String, metadata: &std::fs::Metadata) -> Self {
        Self {
            name,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            mod_time: metadata
                .modified()
                .map(chrono::DateTime::from)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ListResponse {
    pub children: Vec<DirEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TreeResponse {
    pub tree: TreeNode,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StatResponse {
    pub stat: StatInfo,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SpacesResponse {
    pub spaces: Vec<String>,
}
