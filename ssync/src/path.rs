//! Path expressions that may point at the local filesystem or a remote space.

use anyhow::{Context, anyhow};
use client::{ApiClient, ServerInfo};
use common::wire::StatInfo;

/// Reader handed to the copy stage: the byte stream plus its known size.
pub type PathReader = (Box<dyn tokio::io::AsyncRead + Send + Unpin>, u64);

/// A source or destination reference, local or remote, handled through one
/// interface. Values are immutable after construction and cheap to clone
/// into pipeline workers.
#[derive(Clone, Debug)]
pub enum DynamicPath {
    Local(std::path::PathBuf),
    Remote {
        server: std::sync::Arc<ServerInfo>,
        path: String,
    },
}

impl DynamicPath {
    /// Parse `server:virtual_path` (remote) or a bare path (local, resolved
    /// against `base` when relative). More than one colon, an empty remote
    /// subpath or an unknown server name is a parse error.
    pub fn parse(
        raw: &str,
        base: &std::path::Path,
        servers: &std::collections::HashMap<String, std::sync::Arc<ServerInfo>>,
    ) -> anyhow::Result<Self> {
        let mut parts = raw.splitn(3, ':');
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => {
                let path = std::path::Path::new(first);
                if path.as_os_str().is_empty() {
                    return Err(anyhow!("empty path"));
                }
                Ok(DynamicPath::Local(if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    base.join(path)
                }))
            }
            (Some(path), None) => {
                let server = servers
                    .get(first)
                    .ok_or_else(|| anyhow!("server '{first}' does not exist"))?;
                if path.is_empty() {
                    return Err(anyhow!("empty path"));
                }
                Ok(DynamicPath::Remote {
                    server: server.clone(),
                    path: path.to_string(),
                })
            }
            (Some(_), Some(_)) => Err(anyhow!("more than one colon")),
        }
    }

    /// True when the expression contains a glob metacharacter.
    pub fn is_pattern(&self) -> bool {
        match self {
            DynamicPath::Local(path) => common::fsglob::is_pattern(&path.to_string_lossy()),
            DynamicPath::Remote { path, .. } => common::fsglob::is_pattern(path),
        }
    }

    /// Basename used when copying into a directory destination.
    pub fn base_name(&self) -> anyhow::Result<String> {
        let name = match self {
            DynamicPath::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            DynamicPath::Remote { path, .. } => path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        };
        name.ok_or_else(|| anyhow!("path '{self}' does not have a basename"))
    }

    /// Child path under a directory destination.
    pub fn child(&self, name: &str) -> Self {
        match self {
            DynamicPath::Local(path) => DynamicPath::Local(path.join(name)),
            DynamicPath::Remote { server, path } => DynamicPath::Remote {
                server: server.clone(),
                path: format!("{}/{}", path.trim_end_matches('/'), name),
            },
        }
    }

    /// Uniform stat for local paths and remote virtual paths.
    pub async fn stat(&self, client: &ApiClient) -> anyhow::Result<StatInfo> {
        match self {
            DynamicPath::Local(path) => {
                let metadata = tokio::fs::metadata(path)
                    .await
                    .with_context(|| format!("stating '{}'", path.display()))?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Ok(StatInfo::from_metadata(name, &metadata))
            }
            DynamicPath::Remote { server, path } => Ok(client.get_stat(server, path).await?),
        }
    }

    /// Expand this expression into concrete file matches.
    ///
    /// A literal expression that matches nothing is an error; a pattern that
    /// matches nothing yields zero matches and the decision is left to the
    /// caller.
    pub async fn expand_matches(&self, client: &ApiClient) -> anyhow::Result<Vec<DynamicPath>> {
        match self {
            DynamicPath::Local(path) => {
                let hits = common::fsglob::expand(path).await?;
                let mut matches = Vec::with_capacity(hits.len());
                for hit in hits {
                    let metadata = tokio::fs::metadata(&hit)
                        .await
                        .with_context(|| format!("stating match '{}'", hit.display()))?;
                    if !metadata.is_dir() {
                        matches.push(DynamicPath::Local(hit));
                    }
                }
                if matches.is_empty() && !self.is_pattern() {
                    return Err(anyhow!("no file or directory '{}'", path.display()));
                }
                Ok(matches)
            }
            DynamicPath::Remote { server, path } => {
                let matched = client
                    .get_matches(server, path)
                    .await
                    .with_context(|| format!("getting matches for '{self}'"))?;
                if matched.is_empty() && !self.is_pattern() {
                    return Err(anyhow!("no file matched path '{self}'"));
                }
                Ok(matched
                    .into_iter()
                    .map(|found| DynamicPath::Remote {
                        server: server.clone(),
                        path: found,
                    })
                    .collect())
            }
        }
    }

    /// Open this path for reading, returning the stream and its size.
    pub async fn reader(&self, client: &ApiClient) -> anyhow::Result<PathReader> {
        match self {
            DynamicPath::Local(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("opening '{}'", path.display()))?;
                let metadata = file
                    .metadata()
                    .await
                    .with_context(|| format!("stating '{}'", path.display()))?;
                Ok((Box::new(file), metadata.len()))
            }
            DynamicPath::Remote { server, path } => {
                let (stream, size) = client.get_file(server, path).await?;
                Ok((stream, size))
            }
        }
    }

    /// Write `reader` to this destination, following the PutFile contract:
    /// an existing directory destination becomes `<self>/<src_name>`, the
    /// parent of a literal destination must already exist, and existing
    /// files are only replaced with `force`.
    pub async fn write_from<R>(
        &self,
        client: &ApiClient,
        src_name: &str,
        force: bool,
        reader: R,
    ) -> anyhow::Result<()>
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        match self {
            DynamicPath::Local(path) => write_local(path, src_name, force, reader).await,
            DynamicPath::Remote { server, path } => {
                client
                    .put_new_file(server, path, src_name, force, reader)
                    .await?;
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for DynamicPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DynamicPath::Local(path) => write!(f, "{}", path.display()),
            DynamicPath::Remote { server, path } => write!(f, "{}:{}", server.name, path),
        }
    }
}

async fn stat_optional(path: &std::path::Path) -> anyhow::Result<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("stating '{}'", path.display())),
    }
}

async fn write_local<R>(
    path: &std::path::Path,
    src_name: &str,
    force: bool,
    mut reader: R,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut dest = path.to_path_buf();
    let mut exists = false;
    if let Some(metadata) = stat_optional(&dest).await? {
        if metadata.is_dir() {
            dest.push(src_name);
            if let Some(inner) = stat_optional(&dest).await? {
                if inner.is_dir() {
                    return Err(anyhow!("path '{}' is a directory", dest.display()));
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
            .ok_or_else(|| anyhow!("path '{}' has no parent", dest.display()))?;
        match stat_optional(parent).await? {
            None => {
                return Err(anyhow!("parent dir '{}' does not exist", parent.display()));
            }
            Some(metadata) if !metadata.is_dir() => {
                return Err(anyhow!("parent dir '{}' is not a directory", parent.display()));
            }
            Some(_) => {}
        }
    }
    if exists && !force {
        return Err(anyhow!("file '{}' already exists", dest.display()));
    }
    let mut file = tokio::fs::File::create(&dest)
        .await
        .with_context(|| format!("creating '{}'", dest.display()))?;
    tokio::io::copy(&mut reader, &mut file)
        .await
        .with_context(|| format!("writing '{}'", dest.display()))?;
    Ok(())
}
