//! Builds small tar archives on disk, plain or compressed.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// `(name, Some(data))` is a file, `(name, None)` a directory (name ends with '/').
pub type Entry<'a> = (&'a str, Option<&'a [u8]>);

fn append_all<W: Write>(builder: &mut tar::Builder<W>, entries: &[Entry<'_>]) {
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        match data {
            Some(bytes) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(bytes.len() as u64);
                header.set_mode(0o644);
                builder.append_data(&mut header, name, *bytes).unwrap();
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder.append_data(&mut header, name, std::io::empty()).unwrap();
            }
        }
    }
}

pub fn write_tar(path: &Path, entries: &[Entry<'_>]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    append_all(&mut builder, entries);
    builder.into_inner().unwrap().flush().unwrap();
}

pub fn write_tar_gz(path: &Path, entries: &[Entry<'_>]) {
    let enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(enc);
    append_all(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn write_tar_bz2(path: &Path, entries: &[Entry<'_>]) {
    let enc = bzip2::write::BzEncoder::new(File::create(path).unwrap(), bzip2::Compression::default());
    let mut builder = tar::Builder::new(enc);
    append_all(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn write_tar_xz(path: &Path, entries: &[Entry<'_>]) {
    let enc = xz2::write::XzEncoder::new(File::create(path).unwrap(), 6);
    let mut builder = tar::Builder::new(enc);
    append_all(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
}

/// Regular files whose header names are written byte-for-byte, bypassing the
/// builder's path checks (`..`, non-UTF-8).
pub fn write_tar_raw_names(path: &Path, entries: &[(&[u8], &[u8])]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        let field = &mut header.as_gnu_mut().unwrap().name;
        field[..name.len()].copy_from_slice(name);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap().flush().unwrap();
}
