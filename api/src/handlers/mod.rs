//! Transfer API request handlers.
//!
//! Every handler follows the same shape: parse input, resolve the virtual
//! path, authorize the caller for the resolved space, then perform the
//! filesystem operation and encode the response.

mod dirs;
mod files;
mod spaces;

pub use dirs::{get_list, get_tree};
pub use files::{get_file, get_matches, get_stat, put_new_file};
pub use spaces::get_spaces;

#[derive(serde::Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(serde::Deserialize)]
pub struct PatternQuery {
    #[serde(default)]
    pub pattern: String,
}
