//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler and
//! dispatches the subcommand.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use relocate::cli::{Args, Command, ExtractArgs, FetchArgs, FlattenArgs};
use relocate::config::{create_template_config, load_config, CONFIG_ENV};
use relocate::output as out;
use relocate::{
    default_config_path, extract_with, flatten_with, shutdown, Config, ConflictPolicy,
    ExtractOptions, Fetcher, FlattenOptions,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }
    let Some(command) = args.command.clone() else {
        bail!("no command given; run `relocate --help` for usage");
    };

    // Defaults < config.xml < CLI flags.
    let mut cfg = load_config()?;
    args.apply_overrides(&mut cfg)?;
    cfg.validate()?;

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json)
        .inspect_err(|e| out::print_error(&format!("Failed to initialize logging: {e}")))?;

    // Guard is dropped on SIGINT as well so the file appender flushes.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; stopping after the current entry...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install Ctrl-C handler")?;
    }

    debug!(?command, ?cfg, "starting relocate");

    let result = match &command {
        Command::Flatten(a) => run_flatten(&cfg, a),
        Command::Extract(a) => run_extract(&cfg, a),
        Command::Fetch(a) => run_fetch(&cfg, a),
        Command::InitConfig => run_init_config(),
    };

    if let Err(e) = &result {
        log_failure(&command, e);
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!(
            "Using {CONFIG_ENV} (explicit):\n  {}\n",
            Path::new(&p).display()
        ));
        out::print_info(&format!(
            "To use the default location, unset {CONFIG_ENV}."
        ));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default relocate config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there yet; `relocate init-config` writes a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

fn run_flatten(cfg: &Config, a: &FlattenArgs) -> Result<()> {
    let opts = FlattenOptions {
        policy: cfg.policy_or(ConflictPolicy::Overwrite),
        dry_run: a.dry_run,
    };
    info!(root = %a.root.display(), policy = %opts.policy, dry_run = opts.dry_run, "Flattening");
    let report = flatten_with(&a.root, &opts)?;
    out::print_flatten_report(&report);
    Ok(())
}

fn run_extract(cfg: &Config, a: &ExtractArgs) -> Result<()> {
    let opts = ExtractOptions {
        prefix_filter: a.prefix.clone(),
        policy: cfg.policy_or(ConflictPolicy::default()),
        dry_run: a.dry_run,
    };
    info!(
        archive = %a.archive.display(),
        target = %a.target.display(),
        prefix = %opts.prefix_filter,
        policy = %opts.policy,
        "Extracting"
    );
    let report = extract_with(&a.archive, &a.target, &opts)?;
    out::print_extract_report(&report, &a.target);
    Ok(())
}

fn run_fetch(cfg: &Config, a: &FetchArgs) -> Result<()> {
    let mut urls = a.urls.clone();
    if let Some(file) = &a.input_file {
        urls.extend(read_url_list(file)?);
    }
    if urls.is_empty() {
        bail!("no URLs given; pass them as arguments or with --input-file");
    }

    let options = cfg.fetch_options();
    info!(
        target = %a.target.display(),
        urls = urls.len(),
        concurrency = options.concurrency_limit,
        policy = %options.policy,
        "Fetching"
    );
    let fetcher = Fetcher::new(options)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let report = runtime.block_on(fetcher.fetch_all(urls, &a.target))?;
    out::print_batch_report(&report);

    let failed = report.failed().count();
    if failed > 0 {
        bail!("{failed} of {} download(s) failed", report.len());
    }
    Ok(())
}

fn run_init_config() -> Result<()> {
    let path = default_config_path()?;
    create_template_config(&path)?;
    out::print_success(&format!("A template relocate config was written to: {}", path.display()));
    out::print_info("Edit it, or point RELOCATE_CONFIG at another file.");
    Ok(())
}

/// One URL per line; blank lines and `#` comments are skipped.
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read URL list '{}'", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn log_failure(command: &Command, e: &anyhow::Error) {
    let op = match command {
        Command::Flatten(_) => "flatten",
        Command::Extract(_) => "extract",
        Command::Fetch(_) => "fetch",
        Command::InitConfig => "init-config",
    };
    match e.downcast_ref::<relocate::Error>() {
        Some(re) => {
            let code = re.code();
            match re {
                relocate::Error::Filesystem { op: fs_op, path, .. } => {
                    error!(code, kind = ?re.kind(), op, fs_op, path = %path.display(), error = %re, "Operation failed")
                }
                relocate::Error::NotADirectory(path) => {
                    error!(code, kind = ?re.kind(), op, path = %path.display(), "Operation failed: not a directory")
                }
                relocate::Error::Interrupted => {
                    error!(code, kind = ?re.kind(), op, "Operation aborted by user")
                }
                _ => error!(code, kind = ?re.kind(), op, error = %re, "Operation failed"),
            }
        }
        None => error!(op, error = %format!("{e:#}"), "Operation failed"),
    }
}
