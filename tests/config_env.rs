use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

use relocate::config::{load_config, CONFIG_ENV};
use relocate::{default_config_path, Config, ConflictPolicy, LogLevel};

#[test]
#[serial]
fn env_override_is_loaded() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("custom.xml");
    fs::write(
        &cfg_path,
        r#"<config>
  <policy>overwrite</policy>
  <concurrency_limit>3</concurrency_limit>
  <request_timeout_seconds>12</request_timeout_seconds>
  <log_level>quiet</log_level>
</config>"#,
    )
    .unwrap();

    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg_path);
    }
    let resolved = default_config_path().unwrap();
    let cfg = load_config();
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }

    assert_eq!(resolved, cfg_path);
    let cfg = cfg.unwrap();
    assert_eq!(cfg.policy, Some(ConflictPolicy::Overwrite));
    assert_eq!(cfg.concurrency_limit, 3);
    assert_eq!(cfg.request_timeout, Duration::from_secs(12));
    assert_eq!(cfg.log_level, LogLevel::Quiet);
}

#[test]
#[serial]
fn missing_file_means_defaults() {
    let td = tempdir().unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, td.path().join("absent.xml"));
    }
    let cfg = load_config();
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert_eq!(cfg.unwrap(), Config::default());
}

#[test]
#[serial]
fn malformed_file_is_an_error_naming_it() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("bad.xml");
    fs::write(&cfg_path, "<config><policy>rename</config>").unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg_path);
    }
    let err = load_config().unwrap_err();
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert!(format!("{err:#}").contains("bad.xml"), "{err:#}");
}
