//! Request timestamps and artifact file names.
//!
//! Every file a request produces shares one timestamp, so a directory
//! listing groups them:
//!
//! ```text
//! <dir>/2024-05-01T12:00:00.000Z_index_0.pdf
//! <dir>/2024-05-01T12:00:00.000Z_index_1.pdf
//! <dir>/2024-05-01T12:00:00.000Z_merged.pdf
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::error::{Result, UrlCatError};

const STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

static GLOBAL: StampSource = StampSource::new();

/// Millisecond-precision UTC timestamp shared by one request's files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stamp(String);

impl Stamp {
    /// Format a Unix timestamp in milliseconds.
    pub fn from_millis(millis: i64) -> Result<Self> {
        let at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map_err(|e| UrlCatError::other(format!("Timestamp out of range: {e}")))?;
        let formatted = at
            .format(STAMP_FORMAT)
            .map_err(|e| UrlCatError::other(format!("Failed to format timestamp: {e}")))?;
        Ok(Self(formatted))
    }

    /// The formatted stamp.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out strictly increasing stamps.
///
/// Two requests arriving within the same millisecond get different stamps
/// and therefore never write to the same file.
#[derive(Debug)]
pub struct StampSource {
    last_millis: AtomicI64,
}

impl StampSource {
    /// A source that has not issued any stamp yet.
    pub const fn new() -> Self {
        Self {
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// The process-wide source.
    pub fn global() -> &'static StampSource {
        &GLOBAL
    }

    /// Next stamp, at or after the wall clock.
    pub fn next(&self) -> Result<Stamp> {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        Stamp::from_millis(self.next_millis(now))
    }

    fn next_millis(&self, now: i64) -> i64 {
        let mut issued = now;
        // fetch_update only fails when the closure returns None
        let _ = self
            .last_millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                issued = now.max(last.saturating_add(1));
                Some(issued)
            });
        issued
    }
}

impl Default for StampSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of the artifact rendered for the URL at `index`.
pub fn artifact_path(dir: &Path, stamp: &Stamp, index: usize) -> PathBuf {
    dir.join(format!("{stamp}_index_{index}.pdf"))
}

/// Path of the request's final document.
pub fn merged_path(dir: &Path, stamp: &Stamp) -> PathBuf {
    dir.join(format!("{stamp}_merged.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "1970-01-01T00:00:00.000Z")]
    #[case(1_714_564_800_123, "2024-05-01T12:00:00.123Z")]
    #[case(1_714_564_800_007, "2024-05-01T12:00:00.007Z")]
    fn test_stamp_format(#[case] millis: i64, #[case] expected: &str) {
        assert_eq!(Stamp::from_millis(millis).unwrap().as_str(), expected);
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let source = StampSource::new();

        assert_eq!(source.next_millis(1_000), 1_000);
        assert_eq!(source.next_millis(1_000), 1_001);
        assert_eq!(source.next_millis(999), 1_002);
        assert_eq!(source.next_millis(5_000), 5_000);
    }

    #[test]
    fn test_consecutive_stamps_differ() {
        let source = StampSource::new();
        let first = source.next().unwrap();
        let second = source.next().unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_paths() {
        let stamp = Stamp::from_millis(0).unwrap();
        let dir = Path::new("/tmp/out");

        assert_eq!(
            artifact_path(dir, &stamp, 2),
            PathBuf::from("/tmp/out/1970-01-01T00:00:00.000Z_index_2.pdf")
        );
        assert_eq!(
            merged_path(dir, &stamp),
            PathBuf::from("/tmp/out/1970-01-01T00:00:00.000Z_merged.pdf")
        );
    }
}
