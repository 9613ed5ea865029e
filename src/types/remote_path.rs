// ABOUTME: Sanitized remote path used as deploy destination or clean target.
// ABOUTME: Rejects empty paths and anything that resolves to the remote home directory.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Marker the remote shell expands to the login user's home directory.
pub const HOME_MARKER: &str = "~";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemotePathError {
    #[error("remote path cannot be empty")]
    Empty,

    /// rsync mangles the permissions of a home directory used as destination.
    #[error("remote path cannot be the remote home directory")]
    HomeDirectory,

    #[error("remote path has more than one home directory prefix: '{0}'")]
    NestedHome(String),
}

/// A remote path that is safe to hand to rsync, mkdir and rm.
///
/// Relative paths are resolved by the remote shell against the login user's
/// home directory, so `~/data` is stored as `data`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(value: &str) -> Result<Self, RemotePathError> {
        if value.is_empty() {
            return Err(RemotePathError::Empty);
        }

        let normalized = normalize(value);
        if normalized == HOME_MARKER || normalized == "." {
            return Err(RemotePathError::HomeDirectory);
        }

        let stripped = if normalized.starts_with(HOME_MARKER) {
            let rest = normalized
                .split_once('/')
                .map(|(_, rest)| rest.to_string())
                .unwrap_or_default();
            if rest.is_empty() {
                return Err(RemotePathError::HomeDirectory);
            }
            rest
        } else {
            normalized
        };

        if stripped.starts_with(HOME_MARKER) {
            return Err(RemotePathError::NestedHome(value.to_string()));
        }

        Ok(Self(stripped))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a relative component below this path.
    pub fn join(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            self.0.clone()
        } else if self.0.ends_with('/') {
            format!("{}{}", self.0, relative)
        } else {
            format!("{}/{}", self.0, relative)
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lexical normalization: collapses separators, `.` and `..` segments.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_segments() {
        assert_eq!(normalize("a//b/./c/"), "a/b/c");
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize("/../x"), "/x");
        assert_eq!(normalize("../x"), "../x");
        assert_eq!(normalize("a/.."), ".");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn join_handles_separators() {
        let path = RemotePath::new("/abs/data").unwrap();
        assert_eq!(path.join("file.bin"), "/abs/data/file.bin");
        assert_eq!(path.join("/nested/file.bin"), "/abs/data/nested/file.bin");
        assert_eq!(path.join(""), "/abs/data");
    }

    #[test]
    fn root_keeps_single_separator_on_join() {
        let path = RemotePath::new("/").unwrap();
        assert_eq!(path.join("x"), "/x");
    }
}
