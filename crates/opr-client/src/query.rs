//! Query parameters for work package collections.

use opr_core::{AssigneeFilter, SortBy};
use serde_json::{Value, json};

/// Filters and ordering for a work package query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemQuery {
    /// Restrict to one version ID.
    pub version: Option<String>,
    /// Exclude work packages with this status ID.
    pub exclude_status: Option<String>,
    pub assignee: Option<AssigneeFilter>,
    pub type_ids: Vec<String>,
    pub sort_by: Option<SortBy>,
}

impl WorkItemQuery {
    /// The `filters` parameter as a JSON array, one object per filter.
    pub fn filters(&self) -> Value {
        let mut filters = Vec::new();
        if let Some(version) = &self.version {
            filters.push(filter("version", "=", &[version.as_str()]));
        }
        if let Some(status) = &self.exclude_status {
            filters.push(filter("status", "!", &[status.as_str()]));
        }
        match &self.assignee {
            Some(AssigneeFilter::Any) => filters.push(filter("assignee", "*", &[])),
            Some(AssigneeFilter::Users(users)) => {
                let users: Vec<&str> = users.iter().map(String::as_str).collect();
                filters.push(filter("assignee", "=", &users));
            }
            None => {}
        }
        if !self.type_ids.is_empty() {
            let types: Vec<&str> = self.type_ids.iter().map(String::as_str).collect();
            filters.push(filter("type_id", "=", &types));
        }
        Value::Array(filters)
    }

    /// Query string pairs, `pageSize` last.
    pub fn params(&self, page_size: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![("filters", self.filters().to_string())];
        if let Some(sort) = &self.sort_by {
            let direction = if sort.descending { "desc" } else { "asc" };
            params.push(("sortBy", json!([[sort.field, direction]]).to_string()));
        }
        params.push(("pageSize", page_size.to_string()));
        params
    }
}

fn filter(name: &str, operator: &str, values: &[&str]) -> Value {
    json!({ name: { "operator": operator, "values": values } })
}
