//! CLI subcommand implementations.

pub mod backlog;
pub mod projects;
pub mod render;
pub mod tasks;
pub mod version;
pub mod work_packages;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveTime, Utc};
use opr_client::WorkItemQuery;
use opr_core::{
    Enricher, NoActiveVersion, Options, RawWorkItem, ReportOptions, Version, VersionSelector,
    WorkItem, enrich_versions, find_version_id_by_name, parse_options,
};

use crate::Config;
use crate::source::RecordSource;

/// Shared inputs of report commands.
pub struct ReportContext<'a> {
    pub source: &'a dyn RecordSource,
    pub config: &'a Config,
    /// Reference instant when a report has no `date` option.
    pub now: DateTime<Utc>,
}

impl<'a> ReportContext<'a> {
    pub fn new(source: &'a dyn RecordSource, config: &'a Config, now: DateTime<Utc>) -> Self {
        Self {
            source,
            config,
            now,
        }
    }

    /// Instance URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// The `project` option, falling back to the configured project.
    pub fn project<'o>(&'o self, options: &'o ReportOptions) -> Option<&'o str> {
        options
            .project
            .as_deref()
            .or(self.config.project_id.as_deref())
    }

    fn reference_time(&self, options: &ReportOptions) -> DateTime<Utc> {
        options
            .date
            .map_or(self.now, |date| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Versions active at the reference time, in start-date order.
    pub fn current_versions(&self, options: &ReportOptions) -> Result<Vec<Version>> {
        let versions = enrich_versions(&self.source.versions(self.project(options))?);
        let selector = VersionSelector::new(&versions, self.reference_time(options))
            .lookahead(self.config.lookahead())
            .name_pattern(options.name.clone());
        let current: Vec<Version> = selector.candidates().cloned().collect();
        tracing::debug!(
            versions = versions.len(),
            current = current.len(),
            "selected current versions"
        );
        Ok(current)
    }

    /// The first current version.
    pub fn active_version(&self, options: &ReportOptions) -> Result<Version> {
        match self.current_versions(options)?.into_iter().next() {
            Some(version) => Ok(version),
            None => Err(NoActiveVersion.into()),
        }
    }

    /// Version ID from the `version` option, or from the first version
    /// whose name matches `name`.
    pub fn resolve_version(&self, options: &ReportOptions) -> Result<String> {
        if let Some(version) = &options.version {
            return Ok(version.clone());
        }
        let Some(pattern) = &options.name else {
            bail!("name not set: pass version=ID or name=PATTERN");
        };
        let versions =
            enrich_versions(&self.source.versions(self.config.project_id.as_deref())?);
        match find_version_id_by_name(&versions, pattern) {
            Some(id) => Ok(id.to_string()),
            None => bail!("version missing: no version name matches {}", pattern.as_str()),
        }
    }

    /// Enriched work packages of a project.
    pub fn work_items(&self, project: &str, query: &WorkItemQuery) -> Result<Vec<WorkItem>> {
        let raw = self.source.work_items(project, query)?;
        Ok(self.enrich(&raw))
    }

    /// Derives report fields, dropping records that lack a project or status.
    pub fn enrich(&self, raw: &[RawWorkItem]) -> Vec<WorkItem> {
        let enriched = Enricher::new(self.config.closed_status_id.as_str(), self.base_url())
            .enrich(raw);
        if enriched.skipped > 0 {
            tracing::debug!(
                skipped = enriched.skipped,
                "some work packages could not be used"
            );
        }
        enriched.items
    }

    /// Enriched work packages of a version, fetched from its defining project.
    pub fn version_items(
        &self,
        version: &Version,
        options: &ReportOptions,
    ) -> Result<Vec<WorkItem>> {
        let query = self.query(options, Some(version.id.to_string()));
        self.work_items(version.defining_project_id.as_str(), &query)
    }

    /// API query for the filters in `options`.
    pub fn query(&self, options: &ReportOptions, version: Option<String>) -> WorkItemQuery {
        WorkItemQuery {
            version,
            exclude_status: (!options.include_closed)
                .then(|| self.config.closed_status_id.clone()),
            assignee: options.assignee.clone(),
            type_ids: options.type_ids.clone(),
            sort_by: options.sort_by.clone(),
        }
    }
}

/// Parses and validates trailing option tokens.
pub fn report_options(tokens: &[String]) -> Result<ReportOptions> {
    Ok(ReportOptions::from_options(&parse_options(tokens))?)
}

/// Validates an option map that a command has already adjusted.
pub fn validated(options: &Options) -> Result<ReportOptions> {
    Ok(ReportOptions::from_options(options)?)
}
