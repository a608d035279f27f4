//! Core reporting logic for work packages.
//!
//! This crate contains the pure parts of the reports:
//! - Enrichment: deriving report fields from raw API records
//! - Summaries: open/closed/total hours, story points and leaf effort
//! - Clustering: grouping work packages by project
//! - Version selection: finding the active version for a date
//! - Display order and report options

pub mod cluster;
pub mod duration;
pub mod enrich;
pub mod options;
pub mod order;
pub mod raw;
pub mod summary;
pub mod types;
pub mod version;
pub mod work_item;

pub use cluster::{
    ClusterHourSums, ClusterHours, ProjectCluster, ProjectClusters, cluster_by_project,
};
pub use duration::{FormatError, hours_or_zero, parse_duration_hours};
pub use enrich::{
    DEFAULT_CLOSED_STATUS_ID, Enriched, Enricher, MissingLinkError, enrich_versions,
    version_from_raw,
};
pub use options::{
    AssigneeFilter, OptionValue, Options, OptionsError, ReportOptions, SortBy, parse_options,
};
pub use order::{order_cluster_for_display, order_for_display};
pub use raw::{Collection, Decoded, Link, RawProject, RawVersion, RawWorkItem};
pub use summary::{HourSums, RollupTotals, summarize};
pub use types::{ProjectId, StatusId, ValidationError};
pub use version::{
    DEFAULT_LOOKAHEAD_DAYS, NoActiveVersion, Version, VersionSelector, VersionStatus,
    find_version_id_by_name,
};
pub use work_item::{Hours, WorkItem};
