//! Concurrent URL fetching into a directory.

mod batch;
mod client;
mod naming;

pub use batch::{
    fetch_all, BatchReport, DownloadTask, FetchOptions, Fetcher, TaskOutcome,
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_REQUEST_TIMEOUT,
};
pub use client::{HttpGet, HttpResponse, ReqwestClient};
pub use naming::{suggested_name, DEFAULT_FILENAME};
