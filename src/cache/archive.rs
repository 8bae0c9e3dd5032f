//! Totals for repositories that can no longer be queried.
//!
//! Repositories get deleted, or access to them is lost, but the work done in
//! them still happened. The archive file records their final figures in the
//! same five-column format as the cache, between a fixed-size header and a
//! three-line trailer whose last line carries an extra commit count in its
//! fifth column.

use std::{fs, io, path::Path};

use tracing::info;

use super::{CacheError, CacheResult, HEADER_LINES};

/// File name of the archive inside the cache directory.
pub const ARCHIVE_FILE: &str = "repository_archive.txt";

const TRAILER_LINES: usize = 3;

/// Figures recovered from the archive file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveTotals {
    /// Lines added across archived repositories.
    pub added: i64,
    /// Lines deleted across archived repositories.
    pub deleted: i64,
    /// Commits authored by the profile owner.
    pub commits: i64,
    /// Number of archived repositories.
    pub repositories: i64,
}

/// Read the archive file from the cache directory.
///
/// A missing or too-short file contributes zeros rather than failing the run.
pub fn read(dir: &Path) -> CacheResult<ArchiveTotals> {
    let path = dir.join(ARCHIVE_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(parse(&contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no repository archive; skipping");
            Ok(ArchiveTotals::default())
        }
        Err(source) => Err(CacheError::Read { path, source }),
    }
}

fn parse(contents: &str) -> ArchiveTotals {
    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() < HEADER_LINES + TRAILER_LINES {
        return ArchiveTotals::default();
    }

    let data = &lines[HEADER_LINES..lines.len() - TRAILER_LINES];
    let mut totals = ArchiveTotals {
        repositories: data.len() as i64,
        ..ArchiveTotals::default()
    };

    for line in data {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 5 {
            totals.commits += parts[2].parse::<i64>().unwrap_or(0);
            totals.added += parts[3].parse::<i64>().unwrap_or(0);
            totals.deleted += parts[4].parse::<i64>().unwrap_or(0);
        }
    }

    // The trailer's last line records commits made to repositories that were
    // archived mid-history, fifth column, optionally comma-terminated.
    if let Some(last) = lines.last() {
        let parts: Vec<&str> = last.split_whitespace().collect();
        if let Some(extra) = parts.get(4) {
            totals.commits += extra.trim_end_matches(',').parse::<i64>().unwrap_or(0);
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> String {
        let mut contents = String::new();
        for i in 0..HEADER_LINES {
            contents.push_str(&format!("# archive header {i}\n"));
        }
        contents.push_str("aaaa 300 120 5000 1200\n");
        contents.push_str("bbbb 80 80 900 40\n");
        contents.push_str("# trailer start\n");
        contents.push_str("# trailer middle\n");
        contents.push_str("# extra archived commits: 17,\n");
        contents
    }

    #[test]
    fn sums_archived_figures() {
        let totals = parse(&sample_archive());
        assert_eq!(totals.repositories, 2);
        assert_eq!(totals.added, 5900);
        assert_eq!(totals.deleted, 1240);
        // 120 + 80 from data lines, 17 from the trailer.
        assert_eq!(totals.commits, 217);
    }

    #[test]
    fn short_file_contributes_zeros() {
        assert_eq!(parse("# just\n# a\n# header\n"), ArchiveTotals::default());
        assert_eq!(parse(""), ArchiveTotals::default());
    }

    #[test]
    fn data_lines_with_missing_columns_are_skipped() {
        let mut contents = String::new();
        for _ in 0..HEADER_LINES {
            contents.push_str("#\n");
        }
        contents.push_str("cccc 1 2\n");
        contents.push_str("#\n#\n# end 0 0 0 0\n");
        let totals = parse(&contents);
        assert_eq!(totals.repositories, 1);
        assert_eq!(totals.added, 0);
        assert_eq!(totals.commits, 0);
    }
}
