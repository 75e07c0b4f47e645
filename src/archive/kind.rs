//! Archive container detection.

use flate2::read::GzDecoder;
use std::fmt;
use std::io::{self, BufRead, Read};

/// Supported tar containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

impl ArchiveKind {
    /// Detect from the leading bytes without consuming them.
    /// Anything without a known compression magic is read as plain tar.
    pub fn sniff<R: BufRead>(reader: &mut R) -> io::Result<Self> {
        let head = reader.fill_buf()?;
        let kind = if head.starts_with(GZIP_MAGIC) {
            ArchiveKind::TarGz
        } else if head.starts_with(BZIP2_MAGIC) {
            ArchiveKind::TarBz2
        } else if head.starts_with(XZ_MAGIC) {
            ArchiveKind::TarXz
        } else {
            ArchiveKind::Tar
        };
        Ok(kind)
    }

    /// Wrap `reader` in the matching streaming decoder.
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            ArchiveKind::Tar => Box::new(reader),
            ArchiveKind::TarGz => Box::new(GzDecoder::new(reader)),
            ArchiveKind::TarBz2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            ArchiveKind::TarXz => Box::new(xz2::read::XzDecoder::new(reader)),
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArchiveKind::Tar => "tar",
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::TarBz2 => "tar.bz2",
            ArchiveKind::TarXz => "tar.xz",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn sniff_leaves_bytes_in_place() {
        let mut r = Cursor::new(vec![0x1f, 0x8b, 0x08, 0x00]);
        assert_eq!(ArchiveKind::sniff(&mut r).unwrap(), ArchiveKind::TarGz);
        let mut all = Vec::new();
        r.read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), 4);

        let mut plain = Cursor::new(b"ustar-ish".to_vec());
        assert_eq!(ArchiveKind::sniff(&mut plain).unwrap(), ArchiveKind::Tar);

        let mut bz = Cursor::new(b"BZh91AY&SY".to_vec());
        assert_eq!(ArchiveKind::sniff(&mut bz).unwrap(), ArchiveKind::TarBz2);

        let mut xz = Cursor::new(vec![0xfd, b'7', b'z', b'X', b'Z', 0x00, 1]);
        assert_eq!(ArchiveKind::sniff(&mut xz).unwrap(), ArchiveKind::TarXz);
    }
}
