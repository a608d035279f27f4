//! Plain work package listings and single work package links.

use std::io::Write;

use anyhow::Result;
use opr_client::WorkItemQuery;
use opr_core::{Enricher, ReportOptions};

use super::ReportContext;
use super::render::{item_line, write_list};

fn write_page<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    project: &str,
    query: &WorkItemQuery,
    link: &str,
) -> Result<()> {
    let page = ctx.source.work_item_page(project, query)?;
    writeln!(
        writer,
        "Work packages ({} of {}) <{link}>",
        page.count, page.total
    )?;
    let items = ctx.enrich(&page.into_elements());
    write_list(writer, items, &ReportOptions::default(), ctx.base_url(), 0)?;
    Ok(())
}

/// Lists the work packages of one version of a project.
pub fn run_version<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    project: &str,
    version: &str,
) -> Result<()> {
    let query = WorkItemQuery {
        version: Some(version.to_string()),
        ..WorkItemQuery::default()
    };
    let link = format!("{}/versions/{version}", ctx.base_url());
    write_page(writer, ctx, project, &query, &link)
}

/// Lists the work packages of a project.
pub fn run_project<W: Write>(writer: &mut W, ctx: &ReportContext<'_>, project: &str) -> Result<()> {
    let link = format!("{}/projects/{project}", ctx.base_url());
    write_page(writer, ctx, project, &WorkItemQuery::default(), &link)
}

/// Prints a work package with its link; closed ones are marked `[x]`.
pub fn run_work_package<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    id: &str,
) -> Result<()> {
    let raw = ctx.source.work_package(id)?;
    let item = Enricher::new(ctx.config.closed_status_id.as_str(), ctx.base_url())
        .enrich_one(&raw)?;
    writeln!(
        writer,
        "{} <{}>",
        item_line(&item, &ReportOptions::default()),
        item.href
    )?;
    Ok(())
}
