// src/core/hosts.rs

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::core::models::Hostname;

#[derive(Debug, Error)]
pub enum HostListError {
    #[error("could not read host list {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads a newline-delimited host list. See [`parse_hostnames`].
pub fn load_hostnames(path: &Path) -> Result<BTreeSet<Hostname>, HostListError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| HostListError::Read { path: path.to_path_buf(), source })?;
    Ok(parse_hostnames(&contents))
}

/// Extracts the unique hostnames from a host list.
///
/// Blank lines and `#` comments are skipped, entries written as URLs are reduced
/// to their host, and repeats collapse to a single entry.
pub fn parse_hostnames(contents: &str) -> BTreeSet<Hostname> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(normalize)
        .collect()
}

fn normalize(line: &str) -> Option<Hostname> {
    if !line.contains("://") {
        return Some(Hostname::new(line));
    }
    match Url::parse(line).ok().and_then(|url| url.host_str().map(String::from)) {
        Some(host) => {
            debug!(entry = line, host = %host, "Reduced URL entry to its host.");
            Some(Hostname::new(host))
        }
        None => {
            warn!(entry = line, "Skipping entry without a usable host.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(set: &BTreeSet<Hostname>) -> Vec<&str> {
        set.iter().map(Hostname::as_str).collect()
    }

    #[test]
    fn duplicates_collapse() {
        let hosts = parse_hostnames("a.example\na.example\nb.example\n");
        assert_eq!(names(&hosts), vec!["a.example", "b.example"]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let hosts = parse_hostnames("# production\n\n   \nshop.example\n#old.example\n  api.example  \n");
        assert_eq!(names(&hosts), vec!["api.example", "shop.example"]);
    }

    #[test]
    fn url_entries_reduce_to_host() {
        let hosts = parse_hostnames("https://www.example.org/login\nwww.example.org\nftp://\n");
        assert_eq!(names(&hosts), vec!["www.example.org"]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# hosts").unwrap();
        writeln!(file, "h1.example").unwrap();
        writeln!(file, "h2.example").unwrap();

        let hosts = load_hostnames(file.path()).unwrap();
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_hostnames(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, HostListError::Read { .. }));
    }
}
