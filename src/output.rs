use owo_colors::OwoColorize;
use std::path::Path;

use crate::archive::ExtractReport;
use crate::fetch::BatchReport;
use crate::fs_ops::FlattenReport;

/// Coloured, prefixed user-facing lines. Colours only when stdout is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Unprefixed line for primary, scriptable output ("a -> b").
pub fn print_user(msg: &str) {
    println!("{msg}");
}

fn arrow(src: &Path, dest: &Path) -> String {
    format!("{} -> {}", src.display(), dest.display())
}

pub fn print_flatten_report(report: &FlattenReport) {
    for m in &report.moved {
        print_user(&arrow(&m.source, &m.dest));
    }
    let verb = if report.dry_run { "would move" } else { "moved" };
    let summary = format!(
        "{}: {verb} {} file(s), removed {} director{}, {} already in place",
        report.root.display(),
        report.moved.len(),
        report.removed_dirs.len(),
        if report.removed_dirs.len() == 1 { "y" } else { "ies" },
        report.already_flat,
    );
    if report.is_noop() {
        print_info(&format!("{}: already flat", report.root.display()));
    } else {
        print_success(&summary);
    }
}

pub fn print_extract_report(report: &ExtractReport, target: &Path) {
    for e in &report.extracted {
        print_user(&target.join(&e.relative_path).display().to_string());
    }
    let verb = if report.dry_run { "would extract" } else { "extracted" };
    print_success(&format!(
        "{verb} {} entr{} into {}",
        report.extracted.len(),
        if report.extracted.len() == 1 { "y" } else { "ies" },
        target.display()
    ));
    if report.skipped_existing > 0 {
        print_info(&format!(
            "{} entr{} skipped because the target already exists",
            report.skipped_existing,
            if report.skipped_existing == 1 { "y" } else { "ies" },
        ));
    }
    if report.refused > 0 {
        print_warn(&format!(
            "{} entr{} refused: path escapes the target directory",
            report.refused,
            if report.refused == 1 { "y" } else { "ies" },
        ));
    }
}

pub fn print_batch_report(report: &BatchReport) {
    for (url, path) in report.succeeded() {
        print_user(&format!("{url} -> {}", path.display()));
    }
    for (url, err) in report.failed() {
        print_error(&format!("{url}: {err}"));
    }
    let ok = report.succeeded().count();
    let msg = format!("{ok}/{} download(s) succeeded", report.len());
    if report.is_complete_success() {
        print_success(&msg);
    } else {
        print_warn(&msg);
    }
}
