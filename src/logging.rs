//! Tracing initialization.
//! Builds a subscriber from the program LogLevel, compact or JSON, with an
//! optional non-blocking file layer.
//!
//! Notes:
//! - Console output goes to stderr so stdout stays scriptable ("a -> b" lines).
//! - `RELOCATE_LOG` (EnvFilter syntax) replaces the level-derived filter when set.
//! - File logging is refused if any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use relocate::output as out;
use relocate::platform::open_log_file_secure_append;
use relocate::{default_log_path, path_has_symlink_ancestor, LogLevel};
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Local wall-clock timestamps, e.g. `16/10/26 14:03:59`.
struct LocalClock;

impl FormatTime for LocalClock {
    fn format_time(&self, w: &mut Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

/// Level-derived filter scoped to this crate; dependency noise (hyper, reqwest)
/// stays at warn unless `RELOCATE_LOG` says otherwise.
fn build_env_filter(level_filter: LevelFilter) -> EnvFilter {
    if let Ok(spec) = std::env::var("RELOCATE_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&spec) {
            return filter;
        }
        eprintln!("Ignoring invalid RELOCATE_LOG filter '{spec}'");
    }
    let level = level_filter.to_string().to_ascii_lowercase();
    let global = if level_filter > LevelFilter::WARN { "warn" } else { level.as_str() };
    EnvFilter::new(format!("{global},relocate={level}"))
}

/// Non-blocking appender over the log file, or the reason it stays off.
/// Paths under a symlinked directory are never opened.
fn file_writer(path: &Path) -> std::result::Result<(NonBlocking, WorkerGuard), String> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => return Err("a parent directory is a symlink".into()),
        Err(e) => return Err(format!("cannot inspect parent directories: {e}")),
    }
    let file = open_log_file_secure_append(path).map_err(|e| format!("cannot open: {e}"))?;
    Ok(tracing_appender::non_blocking(file))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tsfmt::layer()
        .with_timer(LocalClock)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(ansi)
        .with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.compact().boxed()
    }
}

/// Initialize tracing based on LogLevel and format. Returns the WorkerGuard of
/// the file appender, if any; it must be held until exit so logs flush.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let env_filter = build_env_filter(to_level_filter(lvl));
    let console_ansi = !json && atty::is(atty::Stream::Stderr);
    let mut layers = vec![fmt_layer(std::io::stderr, json, console_ansi)];

    let mut guard = None;
    if let Some(path) = log_file {
        match file_writer(path) {
            Ok((writer, g)) => {
                layers.push(fmt_layer(writer, json, false));
                guard = Some(g);
            }
            Err(reason) => {
                out::print_warn(&format!(
                    "Not logging to '{}' ({reason}); stderr only.",
                    path.display()
                ));
                if let Ok(def) = default_log_path() {
                    out::print_info(&format!("Default log location: {}", def.display()));
                }
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
    Ok(guard)
}
