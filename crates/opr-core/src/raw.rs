//! Raw API payloads as returned by the work package service (HAL+JSON).
//!
//! These structs are the validation boundary for remote data: fields the
//! reports need are typed here, everything else is ignored. Links are
//! optional at this level; [`crate::enrich`] decides which are required.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::version::VersionStatus;

/// A HAL link object (`{"href": "...", "title": "..."}`).
///
/// `href` is `null` for unset associations such as an empty assignee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Creates a link with the given target and title.
    pub fn new(href: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            href: Some(href.into()),
            title: title.map(String::from),
        }
    }
}

/// A work package record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkItem {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: WorkItemLinks,
}

/// Links embedded in a work package record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Link>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub work_package_type: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Link>,
    /// Only present on work packages that have child work packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Link>>,
}

/// A version (sprint/milestone) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVersion {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub status: VersionStatus,
    #[serde(rename = "_links", default)]
    pub links: VersionLinks,
}

/// Links embedded in a version record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defining_project: Option<Link>,
}

/// A project record, as listed for a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProject {
    pub id: u64,
    #[serde(default)]
    pub identifier: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Formattable>,
}

/// Formatted text as delivered by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formattable {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// A HAL collection page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<T>,
}

/// The embedded element list of a [`Collection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedded<T> {
    pub elements: Vec<T>,
}

impl<T> Collection<T> {
    /// Consumes the page and returns its elements.
    pub fn into_elements(self) -> Vec<T> {
        self.embedded.elements
    }
}

/// A collection page decoded one element at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub page: Collection<T>,
    /// Elements that did not match the record shape and were dropped.
    pub skipped: usize,
}

impl Collection<serde_json::Value> {
    /// Decodes every element on its own, so one malformed record costs only
    /// that record and not the whole page.
    pub fn decode<T: DeserializeOwned>(self) -> Decoded<T> {
        let mut skipped = 0;
        let elements = self
            .embedded
            .elements
            .into_iter()
            .filter_map(|element| {
                let id = element.get("id").cloned();
                match serde_json::from_value(element) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!(id = ?id, error = %err, "skipping malformed record");
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();
        Decoded {
            page: Collection {
                count: self.count,
                total: self.total,
                embedded: Embedded { elements },
            },
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_package_payload_deserializes() {
        let json = r#"{
            "_type": "WorkPackage",
            "id": 42,
            "subject": "Write release notes",
            "lockVersion": 3,
            "storyPoints": 5,
            "estimatedTime": "PT8H",
            "derivedEstimatedTime": null,
            "remainingTime": "PT2H30M",
            "description": {"format": "markdown", "raw": "", "html": ""},
            "_links": {
                "self": {"href": "/api/v3/work_packages/42", "title": "Write release notes"},
                "project": {"href": "/api/v3/projects/7", "title": "Website"},
                "status": {"href": "/api/v3/statuses/1", "title": "New"},
                "assignee": {"href": null},
                "type": {"href": "/api/v3/types/6", "title": "Feature"},
                "version": {"href": "/api/v3/versions/12", "title": "Sprint 12"},
                "children": [{"href": "/api/v3/work_packages/43", "title": "Draft"}]
            }
        }"#;

        let item: RawWorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 42);
        assert_eq!(item.lock_version, Some(3));
        assert_eq!(item.story_points, Some(5.0));
        assert_eq!(item.estimated_time.as_deref(), Some("PT8H"));
        assert_eq!(item.derived_estimated_time, None);
        assert_eq!(
            item.links.project,
            Some(Link::new("/api/v3/projects/7", Some("Website")))
        );
        assert_eq!(item.links.assignee, Some(Link::default()));
        assert_eq!(item.links.children.map(|c| c.len()), Some(1));
    }

    #[test]
    fn missing_links_deserialize_as_none() {
        let item: RawWorkItem = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(item.links, WorkItemLinks::default());
        assert!(item.subject.is_empty());
    }

    #[test]
    fn version_payload_deserializes() {
        let json = r#"{
            "id": 12,
            "name": "Sprint 12",
            "startDate": "2024-01-08",
            "endDate": null,
            "status": "open",
            "_links": {"definingProject": {"href": "/api/v3/projects/3", "title": "Platform"}}
        }"#;

        let version: RawVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.start_date, NaiveDate::from_ymd_opt(2024, 1, 8));
        assert_eq!(version.end_date, None);
        assert_eq!(version.status, VersionStatus::Open);
        assert!(version.links.defining_project.is_some());
    }

    #[test]
    fn collection_unwraps_elements() {
        let json = r#"{
            "_type": "Collection",
            "count": 1,
            "total": 3,
            "_embedded": {"elements": [{"id": 5, "name": "Website", "identifier": "website"}]}
        }"#;

        let page: Collection<RawProject> = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.total, 3);
        let projects = page.into_elements();
        assert_eq!(projects[0].identifier, "website");
        assert_eq!(projects[0].description, None);
    }

    #[test]
    fn malformed_element_only_drops_itself() {
        let json = r#"{"count": 3, "total": 3, "_embedded": {"elements": [
            {"id": 1, "subject": "Fine", "estimatedTime": "PT2H"},
            {"id": 2, "subject": "Bad hours", "estimatedTime": 5},
            {"id": 3, "subject": "Bad points", "storyPoints": "x"}
        ]}}"#;

        let page: Collection<serde_json::Value> = serde_json::from_str(json).unwrap();
        let decoded = page.decode::<RawWorkItem>();

        assert_eq!(decoded.skipped, 2);
        assert_eq!(decoded.page.count, 3);
        let items = decoded.page.into_elements();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subject, "Fine");
    }
}
