//! Versions and active-version selection.
//!
//! A version is a candidate when it is open and its date window overlaps
//! `[now, now + lookahead)`. Candidates are ordered by start date, and the
//! first one is the "active" version.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProjectId;

/// Default lookahead window for active-version selection.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

/// Sharing status of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionStatus {
    Open,
    Locked,
    Closed,
    /// Any status the reports don't know about; never treated as open.
    Other,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Closed => "closed",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl FromStr for VersionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "open" => Self::Open,
            "locked" => Self::Locked,
            "closed" => Self::Closed,
            _ => Self::Other,
        })
    }
}

impl Serialize for VersionStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(status) = s.parse::<Self>();
        Ok(status)
    }
}

/// A version snapshot, read-only for the duration of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub id: u64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: VersionStatus,
    pub defining_project_id: ProjectId,
}

impl Version {
    /// Whether this version's window is open at `now` given the lookahead.
    ///
    /// Start dates are compared at midnight UTC; the end date counts as a full
    /// day, so a version ending today is still active until tomorrow.
    fn is_active_at(&self, now: DateTime<Utc>, lookahead: Duration) -> bool {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return false;
        };
        self.status == VersionStatus::Open
            && midnight_utc(start) < now + lookahead
            && midnight_utc(end) + Duration::days(1) > now
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// No version satisfied the active-window predicate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no active version found")]
pub struct NoActiveVersion;

/// Selects active versions from a snapshot of versions.
#[derive(Debug, Clone)]
pub struct VersionSelector<'a> {
    sorted: Vec<&'a Version>,
    now: DateTime<Utc>,
    lookahead: Duration,
    name_pattern: Option<Regex>,
}

impl<'a> VersionSelector<'a> {
    /// Creates a selector over `versions` for the reference instant `now`.
    ///
    /// Versions are stably sorted by start date; versions without one sort first.
    pub fn new(versions: &'a [Version], now: DateTime<Utc>) -> Self {
        let mut sorted: Vec<&Version> = versions.iter().collect();
        sorted.sort_by_key(|v| v.start_date);
        Self {
            sorted,
            now,
            lookahead: Duration::days(DEFAULT_LOOKAHEAD_DAYS),
            name_pattern: None,
        }
    }

    /// Overrides the lookahead window.
    #[must_use]
    pub fn lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Restricts candidates to versions whose name matches `pattern`.
    #[must_use]
    pub fn name_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.name_pattern = pattern;
        self
    }

    /// Candidate versions in start-date order.
    ///
    /// Evaluated lazily; call again (or clone the iterator) to restart.
    pub fn candidates(&self) -> impl Iterator<Item = &'a Version> + Clone + '_ {
        self.sorted.iter().copied().filter(move |version| {
            version.is_active_at(self.now, self.lookahead)
                && self
                    .name_pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.is_match(&version.name))
        })
    }

    /// The first candidate version.
    pub fn active(&self) -> Result<&'a Version, NoActiveVersion> {
        self.candidates().next().ok_or(NoActiveVersion)
    }
}

/// Finds the first version (in input order) whose name matches `pattern`.
///
/// Unlike [`VersionSelector`], this ignores status and dates.
pub fn find_version_id_by_name(versions: &[Version], pattern: &Regex) -> Option<u64> {
    versions
        .iter()
        .find(|version| pattern.is_match(&version.name))
        .map(|version| version.id)
}
