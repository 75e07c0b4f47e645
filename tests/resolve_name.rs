use std::ffi::{OsStr, OsString};
use std::fs;
use tempfile::tempdir;

use relocate::{resolve_name, ConflictPolicy, Error, ErrorKind};

#[test]
fn free_name_is_returned_unchanged() {
    let td = tempdir().unwrap();
    let name = resolve_name(td.path(), OsStr::new("report.pdf"), &ConflictPolicy::default()).unwrap();
    assert_eq!(name, OsString::from("report.pdf"));
}

#[test]
fn prefix_is_prepended_until_free() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("a.txt"), b"1").unwrap();
    fs::write(td.path().join("cp_a.txt"), b"2").unwrap();
    let name = resolve_name(td.path(), OsStr::new("a.txt"), &ConflictPolicy::default()).unwrap();
    assert_eq!(name, OsString::from("cp_cp_a.txt"));
}

#[test]
fn directories_count_as_occupied() {
    let td = tempdir().unwrap();
    fs::create_dir(td.path().join("data")).unwrap();
    let policy = ConflictPolicy::rename("old-").unwrap();
    let name = resolve_name(td.path(), OsStr::new("data"), &policy).unwrap();
    assert_eq!(name, OsString::from("old-data"));
}

#[test]
fn overwrite_returns_requested_name_even_if_taken() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("a.txt"), b"1").unwrap();
    let name = resolve_name(td.path(), OsStr::new("a.txt"), &ConflictPolicy::Overwrite).unwrap();
    assert_eq!(name, OsString::from("a.txt"));
}

#[test]
fn empty_prefix_fails_before_any_probe() {
    let err = ConflictPolicy::rename("").unwrap_err();
    assert!(matches!(err, Error::InvalidPolicy(_)));
    assert_eq!(err.kind(), ErrorKind::Misuse);
}

#[cfg(unix)]
#[test]
fn dangling_symlink_is_occupied() {
    let td = tempdir().unwrap();
    std::os::unix::fs::symlink(td.path().join("gone"), td.path().join("link")).unwrap();
    let name = resolve_name(td.path(), OsStr::new("link"), &ConflictPolicy::default()).unwrap();
    assert_eq!(name, OsString::from("cp_link"));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_names_are_prefixed_bytewise() {
    use std::os::unix::ffi::OsStrExt;
    let td = tempdir().unwrap();
    let raw = [0xff, 0xfe, b'.', b'b', b'i', b'n'];
    let name = OsStr::from_bytes(&raw);
    fs::write(td.path().join(name), b"x").unwrap();
    let resolved = resolve_name(td.path(), name, &ConflictPolicy::default()).unwrap();
    let mut expected = b"cp_".to_vec();
    expected.extend_from_slice(&raw);
    assert_eq!(resolved.as_bytes(), expected.as_slice());
}
