//! Bounded-concurrency batch download.
//!
//! Every URL becomes one spawned task. A shared semaphore admits at most
//! `concurrency_limit` tasks into the request/write phase at a time; the rest
//! wait for a slot. Name resolution for the local file goes through a shared
//! [`NameReservations`] so two tasks can never claim the same destination
//! under Rename. Under Overwrite they share it, and each body replaces the
//! file whole through a temp file and a rename.
//!
//! One task failing never cancels the others. `fetch_all` returns once every
//! task has finished, with one [`TaskOutcome`] per URL in submission order.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::client::{HttpGet, ReqwestClient};
use super::naming::suggested_name;
use crate::errors::{Error, FetchError, Result};
use crate::fs_ops::helpers::fs_error;
use crate::fs_ops::{ConflictPolicy, NameReservations};
use crate::platform::tmp_sibling_name;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub policy: ConflictPolicy,
    pub concurrency_limit: usize,
    pub request_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// One URL to download into a directory.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub target_directory: PathBuf,
    pub policy: ConflictPolicy,
}

impl DownloadTask {
    pub fn suggested_name(&self) -> Result<String> {
        Ok(suggested_name(&self.url)?)
    }
}

/// Result of one task, tagged with its submission index.
#[derive(Debug)]
pub struct TaskOutcome {
    pub index: usize,
    pub url: String,
    pub result: Result<PathBuf>,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// `(url, written path)` for every successful task.
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(path) => Some((o.url.as_str(), path.as_path())),
            Err(_) => None,
        })
    }

    /// `(url, error)` for every failed task.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.url.as_str(), e)),
        })
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_success)
    }
}

/// Runs download batches against an [`HttpGet`] implementation.
pub struct Fetcher {
    client: Arc<dyn HttpGet>,
    options: FetchOptions,
}

impl Fetcher {
    /// Build a fetcher backed by reqwest.
    pub fn new(options: FetchOptions) -> Result<Self> {
        validate_limit(options.concurrency_limit)?;
        let client = ReqwestClient::new(options.request_timeout)?;
        Ok(Self {
            client: Arc::new(client),
            options,
        })
    }

    pub fn with_client(client: Arc<dyn HttpGet>, options: FetchOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Download every URL into `target`.
    ///
    /// Fails as a whole only for misuse (limit 0) or when `target` cannot be
    /// created; per-URL failures are reported in the returned outcomes.
    pub async fn fetch_all<I, S>(&self, urls: I, target: &Path) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let limit = validate_limit(self.options.concurrency_limit)?;
        tokio::fs::create_dir_all(target)
            .await
            .map_err(fs_error("create target directory", target))?;

        let gate = Arc::new(Semaphore::new(limit));
        let reservations = Arc::new(NameReservations::new());

        let handles: Vec<_> = urls
            .into_iter()
            .map(Into::into)
            .enumerate()
            .map(|(index, url)| {
                let task = DownloadTask {
                    url: url.clone(),
                    target_directory: target.to_path_buf(),
                    policy: self.options.policy.clone(),
                };
                let handle = tokio::spawn(run_task(
                    task,
                    Arc::clone(&self.client),
                    Arc::clone(&gate),
                    Arc::clone(&reservations),
                ));
                (index, url, handle)
            })
            .collect();
        debug!(tasks = handles.len(), limit, "download tasks submitted");

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, url, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(FetchError::TaskPanicked {
                    url: url.clone(),
                    message: join_err.to_string(),
                }
                .into()),
            };
            if let Err(e) = &result {
                warn!(url = %url, code = e.code(), error = %e, "Download failed");
            }
            outcomes.push(TaskOutcome { index, url, result });
        }

        let report = BatchReport { outcomes };
        info!(
            target = %target.display(),
            total = report.len(),
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "Fetch batch finished"
        );
        Ok(report)
    }
}

/// Download `urls` into `target` with at most `concurrency_limit` in flight.
pub async fn fetch_all<I, S>(
    urls: I,
    target: &Path,
    policy: ConflictPolicy,
    concurrency_limit: usize,
) -> Result<BatchReport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fetcher = Fetcher::new(FetchOptions {
        policy,
        concurrency_limit,
        ..FetchOptions::default()
    })?;
    fetcher.fetch_all(urls, target).await
}

fn validate_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(Error::InvalidConcurrency(limit));
    }
    Ok(limit.min(Semaphore::MAX_PERMITS))
}

async fn run_task(
    task: DownloadTask,
    client: Arc<dyn HttpGet>,
    gate: Arc<Semaphore>,
    reservations: Arc<NameReservations>,
) -> Result<PathBuf> {
    let name = task.suggested_name()?;

    // Held until the file is written.
    let _permit = gate
        .acquire_owned()
        .await
        .map_err(|_| FetchError::Transport {
            url: task.url.clone(),
            message: "admission gate closed".into(),
        })?;
    debug!(url = %task.url, "slot acquired");

    let response = client.get(&task.url).await?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: task.url,
            status: response.status,
        }
        .into());
    }

    let dest = reserve_destination(&task, OsString::from(name), &reservations).await?;
    if let Err(e) = write_body(&dest, &response.body, &task.policy).await {
        reservations.release(&dest);
        return Err(e);
    }

    info!(url = %task.url, dest = %dest.display(), bytes = response.body.len(), "Downloaded");
    Ok(dest)
}

/// Resolve and reserve the destination off the async workers; the probe is
/// blocking filesystem I/O.
async fn reserve_destination(
    task: &DownloadTask,
    name: OsString,
    reservations: &Arc<NameReservations>,
) -> Result<PathBuf> {
    let reservations = Arc::clone(reservations);
    let dir = task.target_directory.clone();
    let policy = task.policy.clone();
    tokio::task::spawn_blocking(move || {
        reservations.resolve_and_reserve(&dir, OsStr::new(&name), &policy)
    })
    .await
    .map_err(|join_err| FetchError::TaskPanicked {
        url: task.url.clone(),
        message: join_err.to_string(),
    })?
}

async fn write_body(dest: &Path, body: &[u8], policy: &ConflictPolicy) -> Result<()> {
    if !policy.is_overwrite() {
        return write_new(dest, body).await;
    }

    // Every task sharing the name holds the same `dest`; each writes its own
    // temp file and the renames replace the whole file, never mix it.
    let staged = tmp_sibling_name(dest);
    write_new(&staged, body).await?;
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        warn!(dest = %dest.display(), "Overwriting existing file");
    }
    if let Err(e) = tokio::fs::rename(&staged, dest).await {
        let _ = tokio::fs::remove_file(&staged).await;
        return Err(fs_error("replace file", dest)(e));
    }
    Ok(())
}

/// Create `path` (which must not exist) holding `body`. A partially written
/// file is removed again.
async fn write_new(path: &Path, body: &[u8]) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(fs_error("create file", path))?;
    let written: std::io::Result<()> = async {
        file.write_all(body).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(fs_error("write file", path)(e));
    }
    Ok(())
}
