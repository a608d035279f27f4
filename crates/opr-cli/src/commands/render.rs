//! Plain-text rendering of work package lists.

use std::fmt;
use std::io::{self, Write};

use chrono::NaiveDate;
use opr_core::{
    AssigneeFilter, ReportOptions, RollupTotals, WorkItem, cluster_by_project,
    order_cluster_for_display, order_for_display, summarize,
};

const INDENT: &str = "  ";

/// Formats a figure with at most two decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    // Adding zero turns -0 into 0.
    format!("{}", rounded + 0.0)
}

/// Formats a version's date range as `(d.m.-d.m.)`.
pub fn format_interval(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    const DAY_MONTH: &str = "%-d.%-m.";
    match (start, end) {
        (Some(start), Some(end)) => {
            format!("({}-{})", start.format(DAY_MONTH), end.format(DAY_MONTH))
        }
        (Some(start), None) => format!("(from {})", start.format(DAY_MONTH)),
        (None, Some(end)) => format!("(until {})", end.format(DAY_MONTH)),
        (None, None) => String::new(),
    }
}

/// The overview line for a list.
pub fn format_overview(totals: &RollupTotals, options: &ReportOptions) -> String {
    if options.story_points {
        format!("story points: {}", format_number(totals.story_points))
    } else {
        format!(
            "estimated: {}h, remaining: {}h, completed: {}h",
            format_number(totals.open.estimated),
            format_number(totals.open.remaining),
            format_number(totals.open_completed())
        )
    }
}

/// Lists of only my own work packages leave out the assignee.
fn shows_assignee(options: &ReportOptions) -> bool {
    !matches!(
        &options.assignee,
        Some(AssigneeFilter::Users(users)) if users.as_slice() == ["me"]
    )
}

/// One list entry, e.g. `[ ] #12 Fix header (Alice) (1.5h)`.
pub struct ItemLine<'a> {
    item: &'a WorkItem,
    options: &'a ReportOptions,
}

pub fn item_line<'a>(item: &'a WorkItem, options: &'a ReportOptions) -> ItemLine<'a> {
    ItemLine { item, options }
}

impl fmt::Display for ItemLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { item, options } = self;
        let marker = if item.closed { "[x]" } else { "[ ]" };
        write!(f, "{marker} #{} {}", item.id, item.subject)?;
        if let Some(assignee) = item.assignee_name.as_ref().filter(|_| shows_assignee(options)) {
            write!(f, " ({assignee})")?;
        }
        if options.story_points {
            write!(f, " [{} SP]", format_number(item.story_points.unwrap_or(0.0)))?;
        }
        if options.hours && !item.closed {
            write!(f, " ({}h)", format_number(item.leaf_effort()))?;
        }
        if options.closable && !item.closed {
            if let Some(lock_version) = item.lock_version {
                write!(f, " (lock {lock_version})")?;
            }
        }
        Ok(())
    }
}

/// Writes a work package list, grouped by project when `cluster` is set.
///
/// Clustered lists hide work packages that have children.
pub fn write_list<W: Write>(
    writer: &mut W,
    items: Vec<WorkItem>,
    options: &ReportOptions,
    base_url: &str,
    depth: usize,
) -> io::Result<()> {
    let pad = INDENT.repeat(depth);
    let totals = summarize(&items);

    if options.cluster {
        let clusters = cluster_by_project(items, base_url);
        for cluster in &clusters {
            write!(writer, "{pad}{} <{}>", cluster.title, cluster.href)?;
            if options.story_points {
                write!(writer, " ({} SP)", format_number(cluster.story_points))?;
            }
            writeln!(writer)?;
            for item in order_cluster_for_display(&cluster.work_items) {
                writeln!(writer, "{pad}{INDENT}{}", item_line(item, options))?;
            }
        }
    } else {
        for item in order_for_display(&items) {
            writeln!(writer, "{pad}{}", item_line(item, options))?;
        }
    }

    if options.overview {
        writeln!(writer, "{pad}{}", format_overview(&totals, options))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use opr_core::{Hours, ProjectId, StatusId};

    fn item(id: u64, subject: &str, project: &str, closed: bool) -> WorkItem {
        WorkItem {
            id,
            subject: subject.to_string(),
            project_id: ProjectId::new(project).unwrap(),
            project_title: format!("Project {project}"),
            status_id: StatusId::new(if closed { "10" } else { "1" }).unwrap(),
            closed,
            href: format!("https://op.example.com/work_packages/{id}"),
            hours: Hours {
                estimated: 4.0,
                derived_estimated: 0.0,
                remaining: 1.5,
            },
            story_points: Some(3.0),
            has_children: false,
            assignee_name: Some("Alice".to_string()),
            lock_version: Some(7),
        }
    }

    fn render(items: Vec<WorkItem>, options: &ReportOptions) -> String {
        let mut output = Vec::new();
        write_list(&mut output, items, options, "https://op.example.com", 0).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
        assert_eq!(format_number(-0.001), "0");
    }

    #[test]
    fn interval_degrades_with_missing_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 14);
        assert_eq!(format_interval(start, end), "(1.1.-14.1.)");
        assert_eq!(format_interval(start, None), "(from 1.1.)");
        assert_eq!(format_interval(None, end), "(until 14.1.)");
        assert_eq!(format_interval(None, None), "");
    }

    #[test]
    fn item_line_reflects_flags() {
        let open = item(12, "Fix header", "2", false);
        let closed = item(10, "Ship footer", "2", true);

        let plain = ReportOptions::default();
        assert_eq!(item_line(&open, &plain).to_string(), "[ ] #12 Fix header (Alice)");
        assert_eq!(item_line(&closed, &plain).to_string(), "[x] #10 Ship footer (Alice)");

        let rich = ReportOptions {
            hours: true,
            story_points: true,
            closable: true,
            assignee: Some(AssigneeFilter::Users(vec!["me".to_string()])),
            ..ReportOptions::default()
        };
        assert_eq!(
            item_line(&open, &rich).to_string(),
            "[ ] #12 Fix header [3 SP] (1.5h) (lock 7)"
        );
        assert_eq!(item_line(&closed, &rich).to_string(), "[x] #10 Ship footer [3 SP]");
    }

    #[test]
    fn flat_list_puts_open_items_first() {
        let items = vec![
            item(1, "First", "2", false),
            item(2, "Second", "2", false),
            item(3, "Done", "2", true),
        ];
        let options = ReportOptions {
            overview: true,
            ..ReportOptions::default()
        };
        assert_snapshot!(render(items, &options), @r"
        [ ] #2 Second (Alice)
        [ ] #1 First (Alice)
        [x] #3 Done (Alice)
        estimated: 8h, remaining: 3h, completed: 5h
        ");
    }

    #[test]
    fn clustered_list_groups_by_project_and_hides_parents() {
        let mut parent = item(4, "Epic", "5", false);
        parent.has_children = true;
        let items = vec![
            item(1, "Header", "2", false),
            parent,
            item(2, "Footer", "5", true),
            item(3, "Menu", "2", false),
        ];
        let options = ReportOptions {
            cluster: true,
            story_points: true,
            overview: true,
            ..ReportOptions::default()
        };
        assert_snapshot!(render(items, &options), @r"
        Project 2 <https://op.example.com/projects/2/backlogs> (6 SP)
          [ ] #3 Menu (Alice) [3 SP]
          [ ] #1 Header (Alice) [3 SP]
        Project 5 <https://op.example.com/projects/5/backlogs> (6 SP)
          [x] #2 Footer (Alice) [3 SP]
        story points: 12
        ");
    }
}
