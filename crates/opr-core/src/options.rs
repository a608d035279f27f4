//! Report options given as `name=value` tokens.
//!
//! Tokens are first parsed into a flat [`Options`] map, then validated once
//! into a typed [`ReportOptions`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

/// Option names understood by [`ReportOptions`].
const KNOWN_OPTIONS: [&str; 13] = [
    "project",
    "version",
    "name",
    "assignee",
    "type_id",
    "closed",
    "sortBy",
    "date",
    "hours",
    "story_points",
    "cluster",
    "overview",
    "closable",
];

/// Option validation errors.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// An option that needs a value was given as a bare flag.
    #[error("option `{name}` requires a value")]
    MissingValue { name: &'static str },

    /// A boolean option had an unrecognized value.
    #[error("option `{name}` expects true/false, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    /// The `name` pattern is not a valid regular expression.
    #[error("invalid name pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The `date` option is not `YYYY-MM-DD`.
    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The `sortBy` option is not `field` or `field:asc|desc`.
    #[error("invalid sort {value:?}, expected field or field:asc|desc")]
    InvalidSort { value: String },
}

/// The value of a single option token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A bare `name` token.
    Flag,
    /// A `name=value` token with a non-empty value.
    Value(String),
}

/// Named options, later tokens overriding earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// Sets an option unless the caller already provided it.
    pub fn set_default(&mut self, name: &str, value: OptionValue) {
        self.0.entry(name.to_string()).or_insert(value);
    }

    /// Sets an option, replacing any caller-provided value.
    pub fn set(&mut self, name: &str, value: OptionValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses `name=value` and bare `name` tokens.
///
/// Names and values are trimmed. A token with an empty value is ignored, as
/// is a blank token. Only the first `=` splits, so values may contain `=`.
pub fn parse_options<I, S>(tokens: I) -> Options
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = Options::default();
    for token in tokens {
        match token.as_ref().split_once('=') {
            Some((name, value)) => {
                let (name, value) = (name.trim(), value.trim());
                if !value.is_empty() {
                    options.set(name, OptionValue::Value(value.to_string()));
                }
            }
            None => {
                let name = token.as_ref().trim();
                if !name.is_empty() {
                    options.set(name, OptionValue::Flag);
                }
            }
        }
    }
    options
}

/// Assignee restriction for work package queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeFilter {
    /// Any assigned work package (`assignee=*`).
    Any,
    /// Work packages assigned to one of these users; `me` is the current user.
    Users(Vec<String>),
}

/// Sort order for work package queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub field: String,
    pub descending: bool,
}

impl SortBy {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }
}

/// Validated report options.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub project: Option<String>,
    /// Version ID.
    pub version: Option<String>,
    /// Pattern a version name must match.
    pub name: Option<Regex>,
    pub assignee: Option<AssigneeFilter>,
    pub type_ids: Vec<String>,
    /// When false, closed work packages are excluded from queries.
    pub include_closed: bool,
    pub sort_by: Option<SortBy>,
    /// Reference date for active-version selection, defaulting to now.
    pub date: Option<NaiveDate>,
    /// Show remaining effort per item.
    pub hours: bool,
    /// Show story points per item and cluster.
    pub story_points: bool,
    /// Group items by project.
    pub cluster: bool,
    /// Append an hours or story points overview line.
    pub overview: bool,
    /// Mark open items as closable.
    pub closable: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            project: None,
            version: None,
            name: None,
            assignee: None,
            type_ids: Vec::new(),
            include_closed: true,
            sort_by: None,
            date: None,
            hours: false,
            story_points: false,
            cluster: false,
            overview: false,
            closable: false,
        }
    }
}

impl ReportOptions {
    /// Validates a parsed option map.
    pub fn from_options(options: &Options) -> Result<Self, OptionsError> {
        for name in options.0.keys() {
            if !KNOWN_OPTIONS.contains(&name.as_str()) {
                tracing::debug!(option = %name, "ignoring unknown option");
            }
        }

        let name = string_option(options, "name")?
            .map(|pattern| {
                Regex::new(&pattern).map_err(|source| OptionsError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .transpose()?;

        let date = string_option(options, "date")?
            .map(|value| {
                NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|source| OptionsError::InvalidDate { value, source })
            })
            .transpose()?;

        let assignee = string_option(options, "assignee")?.map(|value| {
            if value == "*" {
                AssigneeFilter::Any
            } else {
                AssigneeFilter::Users(split_list(&value))
            }
        });

        let sort_by = string_option(options, "sortBy")?
            .map(|value| parse_sort(&value))
            .transpose()?;

        Ok(Self {
            project: string_option(options, "project")?,
            version: string_option(options, "version")?,
            name,
            assignee,
            type_ids: string_option(options, "type_id")?
                .map(|value| split_list(&value))
                .unwrap_or_default(),
            include_closed: bool_option(options, "closed")?.unwrap_or(true),
            sort_by,
            date,
            hours: bool_option(options, "hours")?.unwrap_or(false),
            story_points: bool_option(options, "story_points")?.unwrap_or(false),
            cluster: bool_option(options, "cluster")?.unwrap_or(false),
            overview: bool_option(options, "overview")?.unwrap_or(false),
            closable: bool_option(options, "closable")?.unwrap_or(false),
        })
    }
}

fn string_option(options: &Options, name: &'static str) -> Result<Option<String>, OptionsError> {
    match options.get(name) {
        None => Ok(None),
        Some(OptionValue::Flag) => Err(OptionsError::MissingValue { name }),
        Some(OptionValue::Value(value)) => Ok(Some(value.clone())),
    }
}

fn bool_option(options: &Options, name: &'static str) -> Result<Option<bool>, OptionsError> {
    match options.get(name) {
        None => Ok(None),
        Some(OptionValue::Flag) => Ok(Some(true)),
        Some(OptionValue::Value(value)) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(OptionsError::InvalidBool {
                name,
                value: value.clone(),
            }),
        },
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

fn parse_sort(value: &str) -> Result<SortBy, OptionsError> {
    let invalid = || OptionsError::InvalidSort {
        value: value.to_string(),
    };
    let (field, direction) = value.split_once(':').unwrap_or((value, "asc"));
    let field = field.trim();
    if field.is_empty() {
        return Err(invalid());
    }
    let descending = match direction.trim() {
        "asc" => false,
        "desc" => true,
        _ => return Err(invalid()),
    };
    Ok(SortBy {
        field: field.to_string(),
        descending,
    })
}
