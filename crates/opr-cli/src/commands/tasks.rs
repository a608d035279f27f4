//! Work packages of the current versions, grouped by project.
//!
//! This module implements `opr tasks` and `opr my-tasks`.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use opr_core::{
    OptionValue, ProjectClusters, ReportOptions, RollupTotals, Version, WorkItem,
    cluster_by_project, parse_options, summarize,
};
use serde::Serialize;

use super::render::{format_interval, format_number, write_list};
use super::{ReportContext, validated};

/// One current version with its work packages.
#[derive(Debug)]
pub struct VersionTasks {
    pub version: Version,
    pub items: Vec<WorkItem>,
}

/// Fetches the work packages of every current version.
pub fn collect(ctx: &ReportContext<'_>, options: &ReportOptions) -> Result<Vec<VersionTasks>> {
    ctx.current_versions(options)?
        .into_iter()
        .map(|version| {
            let items = ctx.version_items(&version, options)?;
            Ok(VersionTasks { version, items })
        })
        .collect()
}

/// Formats the human-readable task list.
pub fn write_tasks<W: Write>(
    writer: &mut W,
    versions: Vec<VersionTasks>,
    options: &ReportOptions,
    base_url: &str,
) -> std::io::Result<()> {
    if versions.is_empty() {
        writeln!(writer, "No current versions.")?;
        return Ok(());
    }
    for VersionTasks { version, items } in versions {
        let totals = summarize(&items);
        writeln!(
            writer,
            "{} {} - {}h remaining",
            version.name,
            format_interval(version.start_date, version.end_date),
            format_number(totals.nochildren)
        )?;
        write_list(writer, items, options, base_url, 1)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonVersion {
    pub id: u64,
    pub name: String,
    pub href: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Remaining leaf effort (`nochildren`).
    pub remaining: f64,
    pub totals: RollupTotals,
    pub projects: ProjectClusters,
}

/// Formats the task list as JSON.
pub fn format_tasks_json(versions: Vec<VersionTasks>, base_url: &str) -> Result<String> {
    let report: Vec<JsonVersion> = versions
        .into_iter()
        .map(|VersionTasks { version, items }| {
            let totals = summarize(&items);
            JsonVersion {
                id: version.id,
                href: format!("{base_url}/versions/{}", version.id),
                name: version.name,
                start_date: version.start_date,
                end_date: version.end_date,
                remaining: totals.nochildren,
                totals,
                projects: cluster_by_project(items, base_url),
            }
        })
        .collect();
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the tasks command.
pub fn run<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    tokens: &[String],
    json: bool,
) -> Result<()> {
    let mut options = parse_options(tokens);
    options.set("cluster", OptionValue::Flag);
    let options = validated(&options)?;
    report(writer, ctx, &options, json)
}

/// Runs the my-tasks command: tasks assigned to me, with hours.
pub fn run_mine<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    tokens: &[String],
) -> Result<()> {
    let mut options = parse_options(tokens);
    options.set_default("assignee", OptionValue::Value("me".to_string()));
    options.set("hours", OptionValue::Flag);
    options.set("cluster", OptionValue::Flag);
    let options = validated(&options)?;
    report(writer, ctx, &options, false)
}

fn report<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    options: &ReportOptions,
    json: bool,
) -> Result<()> {
    let versions = collect(ctx, options)?;
    if json {
        writeln!(writer, "{}", format_tasks_json(versions, ctx.base_url())?)?;
    } else {
        write_tasks(writer, versions, options, ctx.base_url())?;
    }
    Ok(())
}
