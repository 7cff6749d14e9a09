//! Thin HTTP client for the ssync transfer API.
//!
//! One method per server operation, each returning the same shapes as the
//! equivalent local filesystem call. Non-success responses decode the
//! server's error body; failures that never reached the server surface as
//! a distinct transport error.

use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};

use common::wire::{
    AUTH_SCHEME, DirEntry, ErrorBody, ErrorCode, FILE_PATH_HEADER, FORCE_HEADER, ListResponse,
    MatchResponse, SRC_NAME_HEADER, SpacesResponse, StatInfo, StatResponse, TreeNode,
    TreeResponse,
};

/// A remote server the client knows how to talk to.
#[derive(Clone, Debug)]
pub struct ServerInfo {
    /// Name used in `server:path` expressions.
    pub name: String,
    /// Base URL of the server's transfer API.
    pub address: String,
    /// Credential presented on every request.
    pub guid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error envelope.
    #[error("{code}: {message}")]
    Api { code: ErrorCode, message: String },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Byte stream returned by `get_file`.
pub type FileReader = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// Transfer API client. One underlying HTTP client is shared across every
/// server; the configured timeout applies uniformly to each request.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    fn url(server: &ServerInfo, path: &str) -> String {
        format!("{}{}", server.address.trim_end_matches('/'), path)
    }

    fn get(&self, server: &ServerInfo, path: &str) -> reqwest::RequestBuilder {
        self.http.get(Self::url(server, path)).header(
            reqwest::header::AUTHORIZATION,
            format!("{AUTH_SCHEME} {}", server.guid),
        )
    }

    async fn decode_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => ClientError::Api {
                code: body.code,
                message: body.message,
            },
            Err(_) => ClientError::Decode(format!(
                "non-success status {status} with unreadable error body"
            )),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        server: &ServerInfo,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        tracing::debug!("GET {} {:?} on '{}'", path, query, server.name);
        let response = self.get(server, path).query(query).send().await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// List the immediate children of a remote directory.
    pub async fn get_dir_list(&self, server: &ServerInfo, dir_path: &str) -> Result<Vec<DirEntry>> {
        let response: ListResponse = self
            .get_json(server, "/api/dirs/list", &[("path", dir_path)])
            .await?;
        Ok(response.children)
    }

    /// Fetch the (depth-bounded) recursive tree of a remote directory.
    pub async fn get_dir_tree(&self, server: &ServerInfo, dir_path: &str) -> Result<TreeNode> {
        let response: TreeResponse = self
            .get_json(server, "/api/dirs/tree", &[("path", dir_path)])
            .await?;
        Ok(response.tree)
    }

    /// Stat a remote file or directory.
    pub async fn get_stat(&self, server: &ServerInfo, path: &str) -> Result<StatInfo> {
        let response: StatResponse = self
            .get_json(server, "/api/files/stat", &[("path", path)])
            .await?;
        Ok(response.stat)
    }

    /// Glob match on the server. The server's zero-match NotFound becomes an
    /// empty list; the pattern-vs-literal policy belongs to the caller.
    pub async fn get_matches(&self, server: &ServerInfo, pattern: &str) -> Result<Vec<String>> {
        match self
            .get_json::<MatchResponse>(server, "/api/files/matches", &[("pattern", pattern)])
            .await
        {
            Ok(response) => Ok(response.matches),
            Err(ClientError::Api {
                code: ErrorCode::NotFound,
                ..
            }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Open a remote file for reading, returning the stream and its declared
    /// content length.
    pub async fn get_file(&self, server: &ServerInfo, file_path: &str) -> Result<(FileReader, u64)> {
        tracing::debug!("GET /api/files '{}' on '{}'", file_path, server.name);
        let response = self
            .get(server, "/api/files")
            .query(&[("path", file_path)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        let size = response
            .content_length()
            .ok_or_else(|| ClientError::Decode("missing content length".to_string()))?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok((Box::new(StreamReader::new(stream)), size))
    }

    /// Upload a file body to a remote destination path.
    pub async fn put_new_file<R>(
        &self,
        server: &ServerInfo,
        file_path: &str,
        src_name: &str,
        force: bool,
        reader: R,
    ) -> Result<()>
    where
        R: tokio::io::AsyncRead + Send + 'static,
    {
        tracing::debug!("PUT /api/files/new '{}' on '{}'", file_path, server.name);
        let response = self
            .http
            .put(Self::url(server, "/api/files/new"))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{AUTH_SCHEME} {}", server.guid),
            )
            .header(FILE_PATH_HEADER, file_path)
            .header(SRC_NAME_HEADER, src_name)
            .header(FORCE_HEADER, if force { "true" } else { "false" })
            .body(reqwest::Body::wrap_stream(ReaderStream::new(reader)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(())
    }

    /// Spaces the credential is authorized to use.
    pub async fn get_spaces(&self, server: &ServerInfo) -> Result<Vec<String>> {
        let response: SpacesResponse = self.get_json(server, "/api/spaces", &[]).await?;
        Ok(response.spaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerInfo {
        ServerInfo {
            name: "srv".to_string(),
            address: "http://127.0.0.1:4070/".to_string(),
            guid: "guid".to_string(),
        }
    }

    #[test]
    fn url_joins_without_doubled_slashes() {
        assert_eq!(
            ApiClient::url(&server(), "/api/files"),
            "http://127.0.0.1:4070/api/files"
        );
    }

    #[test]
    fn api_errors_render_code_and_message() {
        let err = ClientError::Api {
            code: ErrorCode::AlreadyExists,
            message: "path 'docs/a.txt' already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "already_exists: path 'docs/a.txt' already exists"
        );
    }
}
