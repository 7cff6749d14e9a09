//! Shared server state.

use std::collections::HashMap;

use crate::auth::UserInfo;

/// Immutable state shared by every request handler.
///
/// Spaces and users are fixed at startup and only ever read afterwards, so
/// the maps are shared across request tasks without locks.
#[derive(Clone)]
pub struct AppState {
    inner: std::sync::Arc<Inner>,
}

struct Inner {
    spaces: HashMap<String, std::path::PathBuf>,
    users: HashMap<String, UserInfo>,
    max_tree_depth: usize,
}

impl AppState {
    pub fn new(
        spaces: HashMap<String, std::path::PathBuf>,
        users: HashMap<String, UserInfo>,
        max_tree_depth: usize,
    ) -> Self {
        Self {
            inner: std::sync::Arc::new(Inner {
                spaces,
                users,
                max_tree_depth,
            }),
        }
    }

    pub fn spaces(&self) -> &HashMap<String, std::path::PathBuf> {
        &self.inner.spaces
    }

    pub fn users(&self) -> &HashMap<String, UserInfo> {
        &self.inner.users
    }

    pub fn max_tree_depth(&self) -> usize {
        self.inner.max_tree_depth
    }
}
