//! The two-stage concurrent copy pipeline.
//!
//! Stage A expands source expressions into concrete file matches; stage B
//! streams every match to the destination. Both stages run on a bounded
//! pool of the same width, so at most 2xW expansions/transfers are in
//! flight at once. A source that fails to expand is skipped with a
//! warning; failed copies are collected and reported together once the
//! remaining matches finish, and the command exits non-zero.

use anyhow::{Context, anyhow};
use client::ApiClient;

use crate::path::DynamicPath;
use crate::progress::{Progress, ProgressReader};

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Overwrite existing destination files.
    pub force: bool,
    /// Worker count per pipeline stage.
    pub workers: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Summary {
    pub files_copied: usize,
    pub bytes_copied: u64,
}

/// Run one copy invocation: expand `srcs`, validate arity against `dest`,
/// then stream every match.
pub async fn run(
    client: &ApiClient,
    srcs: Vec<DynamicPath>,
    dest: DynamicPath,
    settings: &Settings,
    progress: &Progress,
) -> anyhow::Result<Summary> {
    anyhow::ensure!(settings.workers > 0, "worker count must be at least 1");
    // directory mode: with more than one source expression the destination
    // must already be a directory; with a single expression the decision
    // waits until the match count is known
    let mut dest_dir_mode = srcs.len() > 1;
    if dest_dir_mode {
        ensure_dir_dest(client, &dest).await?;
    }
    let matches = expand_sources(client, srcs, settings.workers).await?;
    if matches.is_empty() {
        return Err(anyhow!("no file matched the sources"));
    }
    if !dest_dir_mode && matches.len() > 1 {
        dest_dir_mode = true;
        ensure_dir_dest(client, &dest).await?;
    }
    copy_matches(client, matches, dest, dest_dir_mode, settings, progress).await
}

async fn ensure_dir_dest(client: &ApiClient, dest: &DynamicPath) -> anyhow::Result<()> {
    let stat = dest
        .stat(client)
        .await
        .with_context(|| format!("getting '{dest}' info"))?;
    if !stat.is_dir {
        return Err(anyhow!("path '{dest}' is not a dir (multiple sources)"));
    }
    Ok(())
}

/// Stage A: a bounded pool of workers turns source expressions into file
/// matches. A source that fails to expand is reported and yields nothing.
/// The match channel closes only after every source has been fed and every
/// worker has finished, so the collector can never miss a late match.
async fn expand_sources(
    client: &ApiClient,
    srcs: Vec<DynamicPath>,
    workers: usize,
) -> anyhow::Result<Vec<DynamicPath>> {
    let (src_tx, src_rx) = async_channel::bounded::<DynamicPath>(workers);
    let (match_tx, match_rx) = async_channel::bounded::<DynamicPath>(workers);
    let mut join_set = tokio::task::JoinSet::new();
    for _ in 0..workers {
        let src_rx = src_rx.clone();
        let match_tx = match_tx.clone();
        let client = client.clone();
        join_set.spawn(async move {
            while let Ok(src) = src_rx.recv().await {
                match src.expand_matches(&client).await {
                    Ok(found) => {
                        for one in found {
                            if match_tx.send(one).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        tracing::warn!("getting match for '{}': {:#}", src, error);
                    }
                }
            }
        });
    }
    drop(src_rx);
    drop(match_tx);
    let feeder = tokio::spawn(async move {
        for src in srcs {
            if src_tx.send(src).await.is_err() {
                break;
            }
        }
    });
    let mut matches = Vec::new();
    while let Ok(found) = match_rx.recv().await {
        matches.push(found);
    }
    while let Some(result) = join_set.join_next().await {
        result.context("match expansion task panicked")?;
    }
    feeder.await.context("source feeder task panicked")?;
    Ok(matches)
}

/// Stage B: workers stream each match into the destination. Failed copies
/// are collected while the rest keep going; the invocation fails afterwards
/// if anything went wrong, naming every failed pair.
async fn copy_matches(
    client: &ApiClient,
    matches: Vec<DynamicPath>,
    dest: DynamicPath,
    dest_dir_mode: bool,
    settings: &Settings,
    progress: &Progress,
) -> anyhow::Result<Summary> {
    let total = matches.len();
    let force = settings.force;
    let (match_tx, match_rx) = async_channel::bounded::<DynamicPath>(settings.workers);
    let mut join_set = tokio::task::JoinSet::new();
    for _ in 0..settings.workers {
        let match_rx = match_rx.clone();
        let client = client.clone();
        let dest = dest.clone();
        let progress = progress.clone();
        join_set.spawn(async move {
            let mut summary = Summary::default();
            let mut failures = Vec::new();
            while let Ok(found) = match_rx.recv().await {
                match copy_one(&client, &found, &dest, dest_dir_mode, force, &progress).await {
                    Ok(bytes) => {
                        summary.files_copied += 1;
                        summary.bytes_copied += bytes;
                    }
                    Err(error) => {
                        tracing::error!("copying '{}': {:#}", found, error);
                        failures.push(format!("'{found}': {error:#}"));
                    }
                }
            }
            (summary, failures)
        });
    }
    drop(match_rx);
    let feeder = tokio::spawn(async move {
        for found in matches {
            if match_tx.send(found).await.is_err() {
                break;
            }
        }
    });
    let mut summary = Summary::default();
    let mut failures = Vec::new();
    while let Some(result) = join_set.join_next().await {
        let (worker_summary, worker_failures) = result.context("copy task panicked")?;
        summary.files_copied += worker_summary.files_copied;
        summary.bytes_copied += worker_summary.bytes_copied;
        failures.extend(worker_failures);
    }
    feeder.await.context("match feeder task panicked")?;
    if !failures.is_empty() {
        return Err(anyhow!(
            "{} of {} copies failed:\n  {}",
            failures.len(),
            total,
            failures.join("\n  ")
        ));
    }
    Ok(summary)
}

async fn copy_one(
    client: &ApiClient,
    found: &DynamicPath,
    dest: &DynamicPath,
    dest_dir_mode: bool,
    force: bool,
    progress: &Progress,
) -> anyhow::Result<u64> {
    let src_name = found.base_name()?;
    let (reader, size) = found
        .reader(client)
        .await
        .with_context(|| format!("reading '{found}'"))?;
    let match_dest = if dest_dir_mode {
        dest.child(&src_name)
    } else {
        dest.clone()
    };
    let bar = progress.file_bar(&found.to_string(), size);
    let reader = ProgressReader::new(reader, bar.clone());
    match_dest
        .write_from(client, &src_name, force, reader)
        .await
        .with_context(|| format!("copying '{found}' to '{match_dest}'"))?;
    bar.finish_and_clear();
    Ok(size)
}
