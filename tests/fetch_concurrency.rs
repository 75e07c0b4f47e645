use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use relocate::{
    ConflictPolicy, Error, FetchError, FetchOptions, Fetcher, HttpGet, HttpResponse,
};

/// Fake client: records peak in-flight requests, 404s any URL containing
/// "missing", otherwise echoes the URL as body.
#[derive(Default)]
struct CountingClient {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl HttpGet for CountingClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if url.contains("missing") {
            return Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            });
        }
        Ok(HttpResponse {
            status: 200,
            body: url.as_bytes().to_vec(),
        })
    }
}

fn fetcher(client: &Arc<CountingClient>, policy: ConflictPolicy, limit: usize) -> Fetcher {
    Fetcher::with_client(
        Arc::clone(client) as Arc<dyn HttpGet>,
        FetchOptions {
            policy,
            concurrency_limit: limit,
            ..FetchOptions::default()
        },
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_the_concurrency_limit() {
    let td = tempdir().unwrap();
    let client = Arc::new(CountingClient::default());
    let urls: Vec<String> = (0..15)
        .map(|i| {
            if i == 7 {
                "http://host/missing/file7.bin".to_string()
            } else {
                format!("http://host/file{i}.bin")
            }
        })
        .collect();

    let report = fetcher(&client, ConflictPolicy::default(), 10)
        .fetch_all(urls.clone(), td.path())
        .await
        .unwrap();

    assert_eq!(report.len(), 15);
    assert_eq!(report.succeeded().count(), 14);
    assert_eq!(report.failed().count(), 1);
    assert!(matches!(
        report.outcomes[7].result,
        Err(Error::Fetch(FetchError::Status { status: 404, .. }))
    ));
    assert_eq!(client.calls.load(Ordering::SeqCst), 15);
    let peak = client.peak.load(Ordering::SeqCst);
    assert!(peak <= 10, "peak in-flight {peak} exceeded limit");
    for (i, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
        assert_eq!(outcome.url, urls[i]);
        assert_eq!(outcome.is_success(), i != 7);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn limit_one_serializes_requests() {
    let td = tempdir().unwrap();
    let client = Arc::new(CountingClient::default());
    let urls: Vec<String> = (0..5).map(|i| format!("http://host/s{i}")).collect();

    let report = fetcher(&client, ConflictPolicy::default(), 1)
        .fetch_all(urls, td.path())
        .await
        .unwrap();

    assert!(report.is_complete_success());
    assert_eq!(client.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_404_fails_only_its_own_task() {
    let td = tempdir().unwrap();
    let client = Arc::new(CountingClient::default());
    let urls = vec![
        "http://host/ok-a.txt".to_string(),
        "http://host/missing/b.txt".to_string(),
        "http://host/ok-c.txt".to_string(),
    ];

    let report = fetcher(&client, ConflictPolicy::default(), 2)
        .fetch_all(urls, td.path())
        .await
        .unwrap();

    assert!(!report.is_complete_success());
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "http://host/missing/b.txt");
    assert!(matches!(
        failed[0].1,
        Error::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert_eq!(report.succeeded().count(), 2);
    assert!(td.path().join("ok-a.txt").is_file());
    assert!(td.path().join("ok-c.txt").is_file());
    assert!(!td.path().join("b.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_suggested_name_gets_distinct_files() {
    let td = tempdir().unwrap();
    let client = Arc::new(CountingClient::default());
    let urls = vec![
        "http://a.example/x/file.bin".to_string(),
        "http://b.example/y/file.bin".to_string(),
        "http://c.example/file.bin".to_string(),
    ];

    let report = fetcher(&client, ConflictPolicy::default(), 3)
        .fetch_all(urls.clone(), td.path())
        .await
        .unwrap();
    assert!(report.is_complete_success());

    let written: HashMap<String, String> = report
        .succeeded()
        .map(|(url, path)| {
            (
                path.file_name().unwrap().to_string_lossy().into_owned(),
                url.to_string(),
            )
        })
        .collect();
    let mut names: Vec<_> = written.keys().cloned().collect();
    names.sort();
    assert_eq!(names, vec!["cp_cp_file.bin", "cp_file.bin", "file.bin"]);
    for (name, url) in &written {
        assert_eq!(fs::read_to_string(td.path().join(name)).unwrap(), *url);
    }
}

#[tokio::test]
async fn existing_file_is_renamed_around_or_overwritten() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("data.csv"), "old").unwrap();
    let client = Arc::new(CountingClient::default());
    let url = "http://host/data.csv".to_string();

    let renamed = fetcher(&client, ConflictPolicy::default(), 1)
        .fetch_all(vec![url.clone()], td.path())
        .await
        .unwrap();
    assert_eq!(
        renamed.outcomes[0].result.as_ref().unwrap(),
        &td.path().join("cp_data.csv")
    );
    assert_eq!(fs::read_to_string(td.path().join("data.csv")).unwrap(), "old");

    let replaced = fetcher(&client, ConflictPolicy::Overwrite, 1)
        .fetch_all(vec![url.clone()], td.path())
        .await
        .unwrap();
    assert!(replaced.is_complete_success());
    assert_eq!(fs::read_to_string(td.path().join("data.csv")).unwrap(), url);
}

#[tokio::test]
async fn url_without_path_uses_default_name() {
    let td = tempdir().unwrap();
    let client = Arc::new(CountingClient::default());
    let report = fetcher(&client, ConflictPolicy::default(), 1)
        .fetch_all(["http://host/"], td.path())
        .await
        .unwrap();
    assert!(report.is_complete_success());
    assert!(td.path().join(relocate::fetch::DEFAULT_FILENAME).is_file());
}

/// Body for `?n=<i>` is `1 + 4000 * i` copies of the byte `b'a' + i`.
struct SizedBodies;

fn sized_body(n: u8) -> Vec<u8> {
    vec![b'a' + n; 1 + 4000 * n as usize]
}

#[async_trait]
impl HttpGet for SizedBodies {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let n: u8 = url
            .rsplit_once("n=")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        tokio::task::yield_now().await;
        Ok(HttpResponse {
            status: 200,
            body: sized_body(n),
        })
    }
}

fn temp_leftovers(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".relocate.tmp."))
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overwrite_with_shared_name_keeps_one_whole_body() {
    for _round in 0..10 {
        let td = tempdir().unwrap();
        let urls: Vec<String> = (0..16).map(|i| format!("http://h/same.bin?n={i}")).collect();
        let fetcher = Fetcher::with_client(
            Arc::new(SizedBodies),
            FetchOptions {
                policy: ConflictPolicy::Overwrite,
                concurrency_limit: 16,
                ..FetchOptions::default()
            },
        );

        let report = fetcher.fetch_all(urls, td.path()).await.unwrap();
        assert!(report.is_complete_success());

        let data = fs::read(td.path().join("same.bin")).unwrap();
        let first = data[0];
        assert!((b'a'..b'a' + 16).contains(&first));
        assert_eq!(data, sized_body(first - b'a'));
        assert_eq!(temp_leftovers(td.path()), 0);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn failed_replace_leaves_no_partial_file() {
    let td = tempdir().unwrap();
    fs::create_dir(td.path().join("data.csv")).unwrap();
    fs::write(td.path().join("data.csv/keep"), "k").unwrap();
    let client = Arc::new(CountingClient::default());

    let report = fetcher(&client, ConflictPolicy::Overwrite, 1)
        .fetch_all(["http://host/data.csv"], td.path())
        .await
        .unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        Err(Error::Filesystem { .. })
    ));
    assert_eq!(temp_leftovers(td.path()), 0);
    assert_eq!(fs::read_to_string(td.path().join("data.csv/keep")).unwrap(), "k");
}
