//! Optimistic concurrency expectations for append-only streams.

use crate::error::{DomainError, DomainResult};

/// Expected head of a per-key stream at append time.
///
/// Streams are versioned by the number of records they hold, so an empty
/// stream is at version 0 and the first append produces version 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (imports, replays).
    Any,
    /// Require the stream to be empty.
    NoStream,
    /// Require the stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Expectation derived from the last observed version (`None` = empty stream).
    pub fn from_observed(version: Option<u64>) -> Self {
        match version {
            None | Some(0) => ExpectedVersion::NoStream,
            Some(v) => ExpectedVersion::Exact(v),
        }
    }

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoStream => actual == 0,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
