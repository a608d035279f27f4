//! Where report commands get their raw records from.
//!
//! [`ApiSource`] talks to a live instance; [`SnapshotSource`] reads saved
//! API responses from a directory and applies the query filters locally.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use opr_client::{Client, WorkItemQuery};
use opr_core::types::last_path_segment;
use opr_core::raw::Embedded;
use opr_core::{AssigneeFilter, Collection, Link, RawProject, RawVersion, RawWorkItem};
use serde::de::DeserializeOwned;

const VERSIONS_FILE: &str = "versions.json";
const WORK_PACKAGES_FILE: &str = "work_packages.json";
const PROJECTS_FILE: &str = "projects.json";

/// Raw record access for report commands.
pub trait RecordSource {
    /// Versions of a project, or all versions.
    fn versions(&self, project: Option<&str>) -> Result<Vec<RawVersion>>;

    /// One page of a project's work packages matching `query`.
    fn work_item_page(
        &self,
        project: &str,
        query: &WorkItemQuery,
    ) -> Result<Collection<RawWorkItem>>;

    /// Work packages of a project matching `query`.
    fn work_items(&self, project: &str, query: &WorkItemQuery) -> Result<Vec<RawWorkItem>> {
        Ok(self.work_item_page(project, query)?.into_elements())
    }

    /// A single work package by ID.
    fn work_package(&self, id: &str) -> Result<RawWorkItem>;

    /// Projects a version is shared with.
    fn version_projects(&self, version: &str) -> Result<Collection<RawProject>>;

    /// A single project by ID or identifier.
    fn project(&self, project: &str) -> Result<RawProject>;
}

/// Records fetched from the API.
pub struct ApiSource {
    runtime: tokio::runtime::Runtime,
    client: Client,
}

impl ApiSource {
    pub fn new(client: Client) -> Result<Self> {
        let runtime =
            tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
        Ok(Self { runtime, client })
    }
}

impl RecordSource for ApiSource {
    fn versions(&self, project: Option<&str>) -> Result<Vec<RawVersion>> {
        self.runtime
            .block_on(self.client.fetch_versions(project))
            .context("failed to fetch versions")
    }

    fn work_item_page(
        &self,
        project: &str,
        query: &WorkItemQuery,
    ) -> Result<Collection<RawWorkItem>> {
        self.runtime
            .block_on(self.client.fetch_work_item_page(project, query))
            .with_context(|| format!("failed to fetch work packages of project {project}"))
    }

    fn work_package(&self, id: &str) -> Result<RawWorkItem> {
        self.runtime
            .block_on(self.client.fetch_work_package(id))
            .with_context(|| format!("failed to fetch work package {id}"))
    }

    fn version_projects(&self, version: &str) -> Result<Collection<RawProject>> {
        self.runtime
            .block_on(self.client.fetch_version_projects(version))
            .with_context(|| format!("failed to fetch projects of version {version}"))
    }

    fn project(&self, project: &str) -> Result<RawProject> {
        self.runtime
            .block_on(self.client.fetch_project(project))
            .with_context(|| format!("failed to fetch project {project}"))
    }
}

/// Records read from saved API responses.
///
/// Each file is one collection response. Work package filters are applied
/// locally; `assignee=me` matches any assigned work package since the
/// snapshot has no notion of a current user. Sorting supports `id` and
/// `storyPoints`.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    dir: PathBuf,
}

impl SnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Collection<T>> {
        read_collection(&self.dir.join(file))
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Collection<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Collection<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let decoded = raw.decode::<T>();
    if decoded.skipped > 0 {
        tracing::warn!(
            file = %path.display(),
            skipped = decoded.skipped,
            "dropped malformed records"
        );
    }
    Ok(decoded.page)
}

impl RecordSource for SnapshotSource {
    fn versions(&self, _project: Option<&str>) -> Result<Vec<RawVersion>> {
        Ok(self.read(VERSIONS_FILE)?.into_elements())
    }

    fn work_item_page(
        &self,
        _project: &str,
        query: &WorkItemQuery,
    ) -> Result<Collection<RawWorkItem>> {
        let page = self.read::<RawWorkItem>(WORK_PACKAGES_FILE)?;
        let total = page.total;
        let mut items: Vec<RawWorkItem> = page
            .into_elements()
            .into_iter()
            .filter(|item| matches_query(item, query))
            .collect();

        if let Some(sort) = &query.sort_by {
            match sort.field.as_str() {
                "id" => items.sort_by_key(|item| item.id),
                "storyPoints" => items.sort_by(|a, b| {
                    a.story_points
                        .unwrap_or(0.0)
                        .total_cmp(&b.story_points.unwrap_or(0.0))
                }),
                other => tracing::debug!(field = other, "snapshot ignores sort field"),
            }
            if sort.descending {
                items.reverse();
            }
        }
        Ok(Collection {
            count: items.len(),
            // Without filters the file's own total still applies.
            total: if query.filters() == serde_json::json!([]) {
                total.max(items.len())
            } else {
                items.len()
            },
            embedded: Embedded { elements: items },
        })
    }

    fn work_package(&self, id: &str) -> Result<RawWorkItem> {
        self.read::<RawWorkItem>(WORK_PACKAGES_FILE)?
            .into_elements()
            .into_iter()
            .find(|item| item.id.to_string() == id)
            .with_context(|| format!("work package not found in snapshot: {id}"))
    }

    fn version_projects(&self, _version: &str) -> Result<Collection<RawProject>> {
        self.read(PROJECTS_FILE)
    }

    fn project(&self, project: &str) -> Result<RawProject> {
        self.read::<RawProject>(PROJECTS_FILE)?
            .into_elements()
            .into_iter()
            .find(|candidate| {
                candidate.id.to_string() == project || candidate.identifier == project
            })
            .with_context(|| format!("project not found in snapshot: {project}"))
    }
}

fn link_segment(link: Option<&Link>) -> Option<&str> {
    link.and_then(|link| link.href.as_deref())
        .and_then(last_path_segment)
}

fn matches_query(item: &RawWorkItem, query: &WorkItemQuery) -> bool {
    let links = &item.links;
    let version = link_segment(links.version.as_ref());
    if query.version.as_deref().is_some_and(|wanted| version != Some(wanted)) {
        return false;
    }
    let status = link_segment(links.status.as_ref());
    if query
        .exclude_status
        .as_deref()
        .is_some_and(|excluded| status == Some(excluded))
    {
        return false;
    }
    let assignee = link_segment(links.assignee.as_ref());
    let assignee_matches = match &query.assignee {
        None => true,
        Some(AssigneeFilter::Any) => assignee.is_some(),
        Some(AssigneeFilter::Users(users)) => assignee
            .is_some_and(|assignee| users.iter().any(|user| user == "me" || user == assignee)),
    };
    if !assignee_matches {
        return false;
    }
    let work_package_type = link_segment(links.work_package_type.as_ref());
    query.type_ids.is_empty()
        || query
            .type_ids
            .iter()
            .any(|id| Some(id.as_str()) == work_package_type)
}
