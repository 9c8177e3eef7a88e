//! Request path translation
//!
//! Maps a URL path onto the served root. Query and fragment are dropped,
//! the rest is percent-decoded and normalized segment by segment. A `..`
//! removes the previous segment but never climbs above the root. On
//! Windows, segments holding a drive or `\` separator are skipped; elsewhere
//! `\` is an ordinary file name character.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A request path resolved against the root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub fs_path: PathBuf,
    /// Decoded URL path, used for display in directory listings
    pub display: String,
    /// Whether the URL path ended with `/`
    pub trailing_slash: bool,
}

/// The path was not valid percent-encoded UTF-8, or decoded to a NUL byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPath;

pub fn translate_path(root: &Path, url_path: &str) -> Result<ResolvedPath, InvalidPath> {
    let raw = url_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| InvalidPath)?;

    let trailing_slash = decoded.trim_end().ends_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\0') => return Err(InvalidPath),
            #[cfg(windows)]
            s if s.contains(['\\', ':']) => {}
            s => segments.push(s),
        }
    }

    let mut fs_path = root.to_path_buf();
    fs_path.extend(segments);

    Ok(ResolvedPath {
        fs_path,
        display: decoded.into_owned(),
        trailing_slash,
    })
}
