//! Enriched work packages.

use serde::Serialize;

use crate::types::{ProjectId, StatusId};

/// Time fields of a work package, in fractional hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Hours {
    pub estimated: f64,
    pub derived_estimated: f64,
    pub remaining: f64,
}

/// A work package with the fields reports need, derived from a raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    pub id: u64,
    pub subject: String,
    pub project_id: ProjectId,
    pub project_title: String,
    pub status_id: StatusId,
    /// True only when `status_id` equals the configured closed status.
    pub closed: bool,
    pub href: String,
    pub hours: Hours,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    pub has_children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    /// Optimistic locking token, needed to update the work package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_version: Option<i64>,
}

impl WorkItem {
    /// Remaining effort of a leaf item: hours when estimated, story points otherwise.
    ///
    /// Items without an hour estimate are tracked in story points, so exactly
    /// one unit is picked per item.
    pub fn leaf_effort(&self) -> f64 {
        if self.hours.estimated > 0.0 {
            self.hours.remaining
        } else {
            self.story_points.unwrap_or(0.0)
        }
    }
}
