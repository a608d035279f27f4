//! Enrichment of raw API records into report-ready values.
//!
//! Records are enriched independently (in parallel when the batch is large
//! enough to matter). A record missing a required link is dropped and counted
//! rather than failing the batch.

use rayon::prelude::*;
use thiserror::Error;

use crate::duration::hours_or_zero;
use crate::raw::{Link, RawVersion, RawWorkItem};
use crate::types::{ProjectId, StatusId, last_path_segment};
use crate::version::Version;
use crate::work_item::{Hours, WorkItem};

/// Status ID that marks a work package as closed unless configured otherwise.
pub const DEFAULT_CLOSED_STATUS_ID: &str = "10";

/// A raw record lacks a relational link the reports depend on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("record {record_id} has no usable `{link}` link")]
pub struct MissingLinkError {
    pub record_id: u64,
    pub link: &'static str,
}

/// Result of enriching a batch of work packages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enriched {
    /// Enriched items, in input order.
    pub items: Vec<WorkItem>,
    /// Number of records dropped because of missing links.
    pub skipped: usize,
}

/// Derives [`WorkItem`]s from raw work package records.
#[derive(Debug, Clone)]
pub struct Enricher {
    closed_status_id: String,
    base_url: String,
}

impl Enricher {
    /// Creates an enricher for the given closed status and service URL.
    pub fn new(closed_status_id: impl Into<String>, base_url: &str) -> Self {
        Self {
            closed_status_id: closed_status_id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Enriches a single record.
    pub fn enrich_one(&self, raw: &RawWorkItem) -> Result<WorkItem, MissingLinkError> {
        let project = raw.links.project.as_ref();
        let project_id: ProjectId = link_id(raw.id, project, "project")?;
        let status_id: StatusId = link_id(raw.id, raw.links.status.as_ref(), "status")?;

        let closed = status_id.as_str() == self.closed_status_id;
        let hours = Hours {
            estimated: hours_or_zero("estimatedTime", raw.estimated_time.as_deref()),
            derived_estimated: hours_or_zero(
                "derivedEstimatedTime",
                raw.derived_estimated_time.as_deref(),
            ),
            remaining: hours_or_zero("remainingTime", raw.remaining_time.as_deref()),
        };

        Ok(WorkItem {
            id: raw.id,
            subject: raw.subject.clone(),
            project_id,
            project_title: project.and_then(|l| l.title.clone()).unwrap_or_default(),
            status_id,
            closed,
            href: format!("{}/work_packages/{}", self.base_url, raw.id),
            hours,
            story_points: raw.story_points,
            has_children: raw
                .links
                .children
                .as_ref()
                .is_some_and(|children| !children.is_empty()),
            assignee_name: raw
                .links
                .assignee
                .as_ref()
                .and_then(|l| l.title.clone())
                .filter(|title| !title.is_empty()),
            lock_version: raw.lock_version,
        })
    }

    /// Enriches a batch, dropping records with missing links.
    pub fn enrich(&self, raw: &[RawWorkItem]) -> Enriched {
        let results: Vec<Result<WorkItem, MissingLinkError>> =
            raw.par_iter().map(|record| self.enrich_one(record)).collect();

        let mut enriched = Enriched::default();
        for result in results {
            match result {
                Ok(item) => enriched.items.push(item),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping work package");
                    enriched.skipped += 1;
                }
            }
        }
        if enriched.skipped > 0 {
            tracing::debug!(
                kept = enriched.items.len(),
                skipped = enriched.skipped,
                "enriched work packages"
            );
        }
        enriched
    }
}

/// Converts a raw version record.
pub fn version_from_raw(raw: &RawVersion) -> Result<Version, MissingLinkError> {
    let defining_project_id = link_id(
        raw.id,
        raw.links.defining_project.as_ref(),
        "definingProject",
    )?;

    Ok(Version {
        id: raw.id,
        name: raw.name.clone(),
        start_date: raw.start_date,
        end_date: raw.end_date,
        status: raw.status,
        defining_project_id,
    })
}

/// Converts raw version records, dropping those without a defining project.
pub fn enrich_versions(raw: &[RawVersion]) -> Vec<Version> {
    raw.iter()
        .filter_map(|record| match version_from_raw(record) {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::warn!(error = %err, "skipping version");
                None
            }
        })
        .collect()
}

/// Extracts the trailing ID segment of a link as a validated ID type.
fn link_id<T: TryFrom<String>>(
    record_id: u64,
    link: Option<&Link>,
    name: &'static str,
) -> Result<T, MissingLinkError> {
    let missing = move || MissingLinkError {
        record_id,
        link: name,
    };
    let segment = link
        .and_then(|l| l.href.as_deref())
        .and_then(last_path_segment)
        .ok_or_else(missing)?;
    T::try_from(segment.to_string()).map_err(|_| missing())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{VersionLinks, WorkItemLinks};
    use crate::version::VersionStatus;

    const BASE_URL: &str = "https://op.example.com/";

    fn raw_item(id: u64, status: &str) -> RawWorkItem {
        RawWorkItem {
            id,
            subject: format!("Item {id}"),
            lock_version: Some(2),
            story_points: None,
            estimated_time: Some("PT4H".to_string()),
            derived_estimated_time: None,
            remaining_time: Some("PT1H30M".to_string()),
            links: WorkItemLinks {
                project: Some(Link::new("/api/v3/projects/7", Some("Website"))),
                status: Some(Link::new(format!("/api/v3/statuses/{status}"), Some("Status"))),
                ..WorkItemLinks::default()
            },
        }
    }

    #[test]
    fn enrich_derives_ids_href_and_hours() {
        let enricher = Enricher::new(DEFAULT_CLOSED_STATUS_ID, BASE_URL);
        let item = enricher.enrich_one(&raw_item(42, "1")).unwrap();

        assert_eq!(item.project_id.as_str(), "7");
        assert_eq!(item.project_title, "Website");
        assert_eq!(item.status_id.as_str(), "1");
        assert!(!item.closed);
        assert_eq!(item.href, "https://op.example.com/work_packages/42");
        assert_eq!(
            item.hours,
            Hours {
                estimated: 4.0,
                derived_estimated: 0.0,
                remaining: 1.5,
            }
        );
        assert_eq!(item.lock_version, Some(2));
        assert!(!item.has_children);
        assert_eq!(item.assignee_name, None);
    }

    #[test]
    fn closed_follows_configured_status_only() {
        let enricher = Enricher::new(DEFAULT_CLOSED_STATUS_ID, BASE_URL);
        assert!(enricher.enrich_one(&raw_item(1, "10")).unwrap().closed);
        assert!(!enricher.enrich_one(&raw_item(1, "100")).unwrap().closed);
        assert!(!enricher.enrich_one(&raw_item(1, "1")).unwrap().closed);

        let custom = Enricher::new("12", BASE_URL);
        assert!(!custom.enrich_one(&raw_item(1, "10")).unwrap().closed);
        assert!(custom.enrich_one(&raw_item(1, "12")).unwrap().closed);
    }

    #[test]
    fn malformed_durations_become_zero() {
        let mut raw = raw_item(1, "1");
        raw.estimated_time = Some("eight hours".to_string());
        let item = Enricher::new("10", BASE_URL).enrich_one(&raw).unwrap();
        assert_eq!(item.hours.estimated, 0.0);
        assert_eq!(item.hours.remaining, 1.5);
    }

    #[test]
    fn children_and_assignee_are_extracted() {
        let mut raw = raw_item(1, "1");
        raw.links.children = Some(vec![Link::new("/api/v3/work_packages/2", None)]);
        raw.links.assignee = Some(Link::new("/api/v3/users/5", Some("Dana Scully")));
        let item = Enricher::new("10", BASE_URL).enrich_one(&raw).unwrap();
        assert!(item.has_children);
        assert_eq!(item.assignee_name.as_deref(), Some("Dana Scully"));

        raw.links.children = Some(Vec::new());
        raw.links.assignee = Some(Link::default());
        let item = Enricher::new("10", BASE_URL).enrich_one(&raw).unwrap();
        assert!(!item.has_children);
        assert_eq!(item.assignee_name, None);
    }

    #[test]
    fn missing_links_are_reported() {
        let enricher = Enricher::new("10", BASE_URL);

        let mut no_project = raw_item(3, "1");
        no_project.links.project = None;
        assert_eq!(
            enricher.enrich_one(&no_project),
            Err(MissingLinkError {
                record_id: 3,
                link: "project"
            })
        );

        let mut empty_status = raw_item(4, "1");
        empty_status.links.status = Some(Link::default());
        assert_eq!(
            enricher.enrich_one(&empty_status).unwrap_err().link,
            "status"
        );
    }

    #[test]
    fn batch_enrichment_skips_bad_records_and_keeps_order() {
        let mut bad = raw_item(2, "1");
        bad.links.status = Some(Link::new("/api/v3/statuses/", None));
        let batch = vec![raw_item(1, "1"), bad, raw_item(3, "10")];

        let enriched = Enricher::new("10", BASE_URL).enrich(&batch);
        assert_eq!(enriched.skipped, 1);
        let ids: Vec<u64> = enriched.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn versions_require_defining_project() {
        let raw = RawVersion {
            id: 9,
            name: "Sprint 9".to_string(),
            start_date: None,
            end_date: None,
            status: VersionStatus::Open,
            links: VersionLinks {
                defining_project: Some(Link::new("/api/v3/projects/3", Some("Platform"))),
            },
        };
        let version = version_from_raw(&raw).unwrap();
        assert_eq!(version.defining_project_id.as_str(), "3");

        let orphan = RawVersion {
            links: VersionLinks::default(),
            ..raw.clone()
        };
        assert_eq!(enrich_versions(&[raw, orphan]).len(), 1);
    }
}
