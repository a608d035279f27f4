//! Active version link and remaining hours.

use std::io::Write;

use anyhow::Result;
use opr_core::summarize;

use super::render::format_number;
use super::{ReportContext, report_options};

/// Prints the link of the active version.
pub fn run_link<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    tokens: &[String],
) -> Result<()> {
    let options = report_options(tokens)?;
    let version = ctx.active_version(&options)?;
    writeln!(writer, "{}/versions/{}/", ctx.base_url(), version.id)?;
    Ok(())
}

/// Prints the remaining leaf effort of the active version.
pub fn run_hours<W: Write>(
    writer: &mut W,
    ctx: &ReportContext<'_>,
    tokens: &[String],
) -> Result<()> {
    let options = report_options(tokens)?;
    let version = ctx.active_version(&options)?;
    let items = ctx.version_items(&version, &options)?;
    let totals = summarize(&items);
    tracing::debug!(version = version.id, items = items.len(), "summarized version");
    writeln!(writer, "{}", format_number(totals.nochildren))?;
    Ok(())
}
