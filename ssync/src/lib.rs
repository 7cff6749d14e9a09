//! `ssync` - namespace-scoped remote file synchronization.
//!
//! A server exposes named "spaces" (sandboxed directory roots) over an
//! authenticated HTTP API; the `cp` command resolves mixed local/remote
//! path expressions, expands glob patterns and copies every match to a
//! destination through a bounded two-stage worker pipeline.

pub mod cp;
pub mod path;
pub mod progress;
