//! Project listings and project properties.

use std::io::Write;

use anyhow::{Result, bail};
use opr_core::RawProject;

use super::ReportContext;

fn description(project: &RawProject) -> Option<&str> {
    project
        .description
        .as_ref()
        .and_then(|description| description.raw.as_deref())
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
}

/// Lists the projects a version is shared with, as a list or a Markdown table.
pub fn run_version_projects<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    version: &str,
    table: bool,
) -> Result<()> {
    let page = ctx.source.version_projects(version)?;
    let base_url = ctx.base_url();
    writeln!(
        writer,
        "Projects ({} of {}) <{base_url}/versions/{version}>",
        page.count, page.total
    )?;
    if table {
        writeln!(writer, "| ID | Project | Description |")?;
        writeln!(writer, "|---|---|---|")?;
    }
    for project in page.into_elements() {
        let link = format!("{} <{base_url}/projects/{}>", project.name, project.id);
        let description = description(&project);
        if table {
            let cell = description
                .map(|text| text.lines().map(str::trim).collect::<Vec<_>>().join(" "))
                .unwrap_or_default()
                .replace('|', "\\|");
            writeln!(writer, "| {} | {link} | {cell} |", project.id)?;
            continue;
        }
        writeln!(writer, "- {link}")?;
        for line in description.into_iter().flat_map(str::lines) {
            writeln!(writer, "  {line}")?;
        }
    }
    Ok(())
}

/// Prints one property of a project.
pub fn run_project_info<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    project: &str,
    property: &str,
) -> Result<()> {
    let value = match property {
        "link" => format!("{}/projects/{project}", ctx.base_url()),
        "id" => ctx.source.project(project)?.id.to_string(),
        "identifier" => ctx.source.project(project)?.identifier,
        "name" => ctx.source.project(project)?.name,
        "description" => description(&ctx.source.project(project)?)
            .unwrap_or_default()
            .to_string(),
        other => bail!(
            "unknown project property: {other} (expected id, identifier, name, description or link)"
        ),
    };
    writeln!(writer, "{value}")?;
    Ok(())
}
