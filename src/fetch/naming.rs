//! Local file names for downloads.

use crate::errors::FetchError;

/// Used when the URL path yields nothing usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derive a safe local file name from the last path segment of `url`.
///
/// Query and fragment are ignored; the segment is percent-decoded and
/// sanitized to a single file name. Only http(s) URLs are accepted.
pub fn suggested_name(url: &str) -> Result<String, FetchError> {
    let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        });

    let name = segment.map(|s| sanitize(&s)).unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        Ok(DEFAULT_FILENAME.to_string())
    } else {
        Ok(name)
    }
}

/// Replace separators and control characters, trim dots and spaces at the ends,
/// cap at 255 bytes.
fn sanitize(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment() {
        assert_eq!(
            suggested_name("https://example.com/a/b/file.deb").unwrap(),
            "file.deb"
        );
        assert_eq!(
            suggested_name("https://example.com/dir/").unwrap(),
            "dir"
        );
    }

    #[test]
    fn query_and_fragment_ignored() {
        assert_eq!(
            suggested_name("https://example.com/file.zip?token=abc#top").unwrap(),
            "file.zip"
        );
    }

    #[test]
    fn percent_decoded_and_sanitized() {
        assert_eq!(
            suggested_name("https://example.com/my%20report.pdf").unwrap(),
            "my report.pdf"
        );
        assert_eq!(
            suggested_name("https://example.com/a%2Fb.txt").unwrap(),
            "a_b.txt"
        );
    }

    #[test]
    fn root_falls_back_to_default() {
        assert_eq!(suggested_name("https://example.com/").unwrap(), DEFAULT_FILENAME);
        assert_eq!(suggested_name("https://example.com").unwrap(), DEFAULT_FILENAME);
        assert_eq!(suggested_name("https://example.com/..").unwrap(), DEFAULT_FILENAME);
    }

    #[test]
    fn rejects_non_http() {
        assert!(matches!(
            suggested_name("ftp://example.com/x"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(suggested_name("not a url").is_err());
    }
}
