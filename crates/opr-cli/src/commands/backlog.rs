//! Version backlog and story point totals.
//!
//! Both reports pick a version by `version=ID` or by the first version whose
//! name matches `name=PATTERN`, and only look at stories and epics.

use std::io::Write;

use anyhow::{Context, Result};
use opr_core::{ReportOptions, SortBy, cluster_by_project, summarize};

use super::render::{format_number, write_list};
use super::{ReportContext, report_options};

/// Work package types shown in backlogs.
const BACKLOG_TYPE_IDS: [&str; 2] = ["6", "7"];

fn backlog_types() -> Vec<String> {
    BACKLOG_TYPE_IDS.iter().map(ToString::to_string).collect()
}

/// Runs the backlog command.
pub fn run<W: Write>(writer: &mut W, ctx: &ReportContext<'_>, tokens: &[String]) -> Result<()> {
    let options = ReportOptions {
        type_ids: backlog_types(),
        sort_by: Some(SortBy::asc("storyPoints")),
        story_points: true,
        ..report_options(tokens)?
    };
    let version = ctx.resolve_version(&options)?;
    let project = ctx
        .project(&options)
        .context("no project given: pass project=ID or set project_id")?;

    let items = ctx.work_items(project, &ctx.query(&options, Some(version)))?;
    write_list(writer, items, &options, ctx.base_url(), 0)?;
    Ok(())
}

/// Runs the story-points command.
///
/// With `project=ID` only that project's work packages count; the query
/// itself always runs against the configured project.
pub fn run_story_points<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    tokens: &[String],
) -> Result<()> {
    let options = ReportOptions {
        type_ids: backlog_types(),
        ..report_options(tokens)?
    };
    let version = ctx.resolve_version(&options)?;
    let root = ctx
        .config
        .project_id
        .as_deref()
        .context("project_id is not configured (set OPR_PROJECT_ID or project_id in config.toml)")?;

    let items = ctx.work_items(root, &ctx.query(&options, Some(version)))?;
    let story_points = match &options.project {
        Some(project) => cluster_by_project(items, ctx.base_url())
            .get(project)
            .map_or(0.0, |cluster| cluster.story_points),
        None => summarize(&items).story_points,
    };
    writeln!(writer, "{}", format_number(story_points))?;
    Ok(())
}
