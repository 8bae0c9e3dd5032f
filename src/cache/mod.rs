//! On-disk cache of per-repository commit and LOC figures.
//!
//! Walking a repository's full commit history is the expensive part of a
//! refresh, so each repository's last-seen commit total is stored next to its
//! computed figures and only repositories whose total moved are re-walked.
//!
//! File layout: a fixed-size free-form header (preserved verbatim across
//! rewrites), then one line per repository:
//!
//! ```text
//! <hex(sha256(owner/name))> <commit_total> <my_commits> <loc_added> <loc_deleted>
//! ```

/// Archived-repository totals folded into the final figures.
pub mod archive;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

/// Number of free-form comment lines at the top of every cache file.
pub const HEADER_LINES: usize = 7;

const DEFAULT_HEADER_LINE: &str =
    "# Free-form comment line. Anything in this header survives cache rewrites.";

/// Convenient result alias returning [`CacheError`] failures.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failures that can occur while reading or writing cache files.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be created.
    #[error("failed to create cache directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A cache file could not be read.
    #[error("failed to read cache file `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A cache file could not be written.
    #[error("failed to write cache file `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A data line did not match the expected five-column format.
    #[error("malformed line {line_number} in cache file `{path}`: `{line}`")]
    Malformed {
        path: PathBuf,
        line_number: usize,
        line: String,
    },
}

/// Hex-encoded SHA-256 fingerprint, used both to name the cache file and to
/// key repositories without recording their names in plain text.
pub fn fingerprint(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Cache file location for the given user.
pub fn cache_path(dir: &Path, user_name: &str) -> PathBuf {
    dir.join(format!("{}.txt", fingerprint(user_name)))
}

/// One repository's cached figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Fingerprint of the repository's `owner/name`.
    pub repo_hash: String,
    /// Default-branch commit total when the figures were computed.
    pub commit_total: i64,
    /// Commits authored by the profile owner.
    pub my_commits: i64,
    /// Lines added by those commits.
    pub loc_added: i64,
    /// Lines deleted by those commits.
    pub loc_deleted: i64,
}

impl CacheEntry {
    /// A fresh entry that has never been walked.
    pub fn zeroed(repo_hash: String) -> Self {
        Self {
            repo_hash,
            commit_total: 0,
            my_commits: 0,
            loc_added: 0,
            loc_deleted: 0,
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let repo_hash = parts.next()?.to_string();
        let commit_total = parts.next()?.parse().ok()?;
        let my_commits = parts.next()?.parse().ok()?;
        let loc_added = parts.next()?.parse().ok()?;
        let loc_deleted = parts.next()?.parse().ok()?;
        parts.next().is_none().then_some(Self {
            repo_hash,
            commit_total,
            my_commits,
            loc_added,
            loc_deleted,
        })
    }

    fn render(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.repo_hash, self.commit_total, self.my_commits, self.loc_added, self.loc_deleted
        )
    }
}

/// Summed figures across a set of cache lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocTotals {
    /// Lines added.
    pub added: i64,
    /// Lines deleted.
    pub deleted: i64,
    /// Commits authored by the profile owner.
    pub commits: i64,
}

impl LocTotals {
    /// Net lines of code (added minus deleted).
    pub fn net(&self) -> i64 {
        self.added - self.deleted
    }
}

/// The user's cache file, loaded into memory for reconciliation.
#[derive(Debug)]
pub struct CommitCache {
    path: PathBuf,
    header: Vec<String>,
    entries: Vec<CacheEntry>,
}

impl CommitCache {
    /// Load the user's cache file, creating it with a default header when it
    /// does not exist yet.
    pub fn load_or_init(dir: &Path, user_name: &str) -> CacheResult<Self> {
        let path = cache_path(dir, user_name);
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_contents(path, &contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
                let cache = Self {
                    path: path.clone(),
                    header: default_header(),
                    entries: Vec::new(),
                };
                cache.persist()?;
                info!(path = %path.display(), "created empty cache file");
                Ok(cache)
            }
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    fn from_contents(path: PathBuf, contents: &str) -> CacheResult<Self> {
        let lines: Vec<&str> = contents.lines().collect();
        let header_len = lines.len().min(HEADER_LINES);
        let mut header: Vec<String> = lines[..header_len].iter().map(|s| (*s).to_string()).collect();
        while header.len() < HEADER_LINES {
            header.push(DEFAULT_HEADER_LINE.to_string());
        }

        let mut entries = Vec::new();
        for (offset, line) in lines[header_len..].iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = CacheEntry::parse(line).ok_or_else(|| CacheError::Malformed {
                path: path.clone(),
                line_number: header_len + offset + 1,
                line: (*line).to_string(),
            })?;
            entries.push(entry);
        }

        Ok(Self {
            path,
            header,
            entries,
        })
    }

    /// Cached entries in file order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Look up a repository's entry by its fingerprint.
    pub fn find(&self, repo_hash: &str) -> Option<&CacheEntry> {
        self.entries.iter().find(|entry| entry.repo_hash == repo_hash)
    }

    /// Replace the data lines wholesale, keeping the header.
    pub fn replace_entries(&mut self, entries: Vec<CacheEntry>) {
        self.entries = entries;
    }

    /// Number of cached repositories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no repositories.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum the cached figures over every repository.
    pub fn totals(&self) -> LocTotals {
        self.entries
            .iter()
            .fold(LocTotals::default(), |acc, entry| LocTotals {
                added: acc.added + entry.loc_added,
                deleted: acc.deleted + entry.loc_deleted,
                commits: acc.commits + entry.my_commits,
            })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        for entry in &self.entries {
            out.push_str(&entry.render());
            out.push('\n');
        }
        out
    }

    /// Write the cache back to disk.
    pub fn persist(&self) -> CacheResult<()> {
        fs::write(&self.path, self.render()).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn default_header() -> Vec<String> {
    vec![DEFAULT_HEADER_LINE.to_string(); HEADER_LINES]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_contents() -> String {
        let mut contents = String::new();
        for i in 0..HEADER_LINES {
            contents.push_str(&format!("# header line {i}\n"));
        }
        contents.push_str(&format!("{} 120 40 1000 250\n", fingerprint("octocat/hello")));
        contents.push_str(&format!("{} 5 5 80 3\n", fingerprint("octocat/world")));
        contents
    }

    #[test]
    fn parses_header_and_entries() {
        let cache =
            CommitCache::from_contents(PathBuf::from("cache/test.txt"), &sample_contents())
                .unwrap();
        assert_eq!(cache.header.len(), HEADER_LINES);
        assert_eq!(cache.header[0], "# header line 0");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.entries()[0].commit_total, 120);
        assert_eq!(cache.entries()[1].loc_added, 80);
    }

    #[test]
    fn short_header_is_padded() {
        let cache = CommitCache::from_contents(PathBuf::from("cache/test.txt"), "# only line\n")
            .unwrap();
        assert_eq!(cache.header.len(), HEADER_LINES);
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_line_is_reported_with_position() {
        let mut contents = sample_contents();
        contents.push_str("not a cache line\n");
        let err = CommitCache::from_contents(PathBuf::from("cache/test.txt"), &contents)
            .unwrap_err();
        match err {
            CacheError::Malformed { line_number, line, .. } => {
                assert_eq!(line_number, HEADER_LINES + 3);
                assert_eq!(line, "not a cache line");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn render_round_trips() {
        let path = PathBuf::from("cache/test.txt");
        let cache = CommitCache::from_contents(path.clone(), &sample_contents()).unwrap();
        let rendered = cache.render();
        let reparsed = CommitCache::from_contents(path, &rendered).unwrap();
        assert_eq!(reparsed.header, cache.header);
        assert_eq!(reparsed.entries, cache.entries);
    }

    #[test]
    fn totals_sum_all_entries() {
        let cache =
            CommitCache::from_contents(PathBuf::from("cache/test.txt"), &sample_contents())
                .unwrap();
        let totals = cache.totals();
        assert_eq!(totals.added, 1080);
        assert_eq!(totals.deleted, 253);
        assert_eq!(totals.commits, 45);
        assert_eq!(totals.net(), 827);
    }

    #[test]
    fn find_matches_on_fingerprint() {
        let cache =
            CommitCache::from_contents(PathBuf::from("cache/test.txt"), &sample_contents())
                .unwrap();
        let entry = cache.find(&fingerprint("octocat/world")).unwrap();
        assert_eq!(entry.my_commits, 5);
        assert!(cache.find(&fingerprint("octocat/missing")).is_none());
    }

    #[test]
    fn entry_parse_rejects_extra_columns() {
        assert!(CacheEntry::parse("abc 1 2 3 4 5").is_none());
        assert!(CacheEntry::parse("abc 1 2 3").is_none());
        assert!(CacheEntry::parse("abc 1 2 3 four").is_none());
    }
}
