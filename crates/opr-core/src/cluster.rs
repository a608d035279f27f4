//! Grouping of work packages by owning project.

use std::collections::HashMap;

use serde::Serialize;

use crate::summary::{RollupTotals, summarize};
use crate::types::ProjectId;
use crate::work_item::WorkItem;

/// Hour sums of one open/closed partition of a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClusterHourSums {
    pub estimated: f64,
    pub derived_estimated: f64,
    pub remaining: f64,
}

/// Per-project hours, split by open and closed work packages.
///
/// There is no `total` or `nochildren` here; use [`ProjectCluster::summarize`]
/// for those.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClusterHours {
    pub open: ClusterHourSums,
    pub closed: ClusterHourSums,
}

/// The work packages of one project, with running sums.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCluster {
    pub project_id: ProjectId,
    pub title: String,
    /// Link to the project's backlog.
    pub href: String,
    pub hours: ClusterHours,
    pub story_points: f64,
    pub work_items: Vec<WorkItem>,
}

impl ProjectCluster {
    fn new(item: &WorkItem, base_url: &str) -> Self {
        Self {
            project_id: item.project_id.clone(),
            title: item.project_title.clone(),
            href: format!(
                "{}/projects/{}/backlogs",
                base_url.trim_end_matches('/'),
                item.project_id
            ),
            hours: ClusterHours::default(),
            story_points: 0.0,
            work_items: Vec::new(),
        }
    }

    fn push(&mut self, item: WorkItem) {
        let partition = if item.closed {
            &mut self.hours.closed
        } else {
            &mut self.hours.open
        };
        partition.estimated += item.hours.estimated;
        partition.derived_estimated += item.hours.derived_estimated;
        partition.remaining += item.hours.remaining;
        self.story_points += item.story_points.unwrap_or(0.0);
        self.work_items.push(item);
    }

    /// Full rollup over this cluster's work packages.
    pub fn summarize(&self) -> RollupTotals {
        summarize(&self.work_items)
    }
}

/// Clusters keyed by project, iterated in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectClusters {
    clusters: Vec<ProjectCluster>,
    #[serde(skip)]
    index: HashMap<ProjectId, usize>,
}

impl ProjectClusters {
    /// Looks up the cluster of a project.
    pub fn get(&self, project_id: &str) -> Option<&ProjectCluster> {
        self.index
            .get(project_id)
            .map(|&slot| &self.clusters[slot])
    }

    /// Iterates clusters in the order their projects first appeared.
    pub fn iter(&self) -> std::slice::Iter<'_, ProjectCluster> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProjectClusters {
    type Item = &'a ProjectCluster;
    type IntoIter = std::slice::Iter<'a, ProjectCluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Groups work packages by project.
///
/// Each item lands in exactly one cluster. Clusters are created on first sight
/// of a project, so their order follows the input.
pub fn cluster_by_project(items: Vec<WorkItem>, base_url: &str) -> ProjectClusters {
    let mut clusters = ProjectClusters::default();
    for item in items {
        let slot = match clusters.index.get(&item.project_id) {
            Some(&slot) => slot,
            None => {
                let slot = clusters.clusters.len();
                clusters.clusters.push(ProjectCluster::new(&item, base_url));
                clusters.index.insert(item.project_id.clone(), slot);
                slot
            }
        };
        clusters.clusters[slot].push(item);
    }
    clusters
}
