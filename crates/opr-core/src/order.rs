//! Display order for work package lists.
//!
//! Open items come first, in reverse input order; closed items follow in
//! input order. The reversal is part of the established output format.

use crate::work_item::WorkItem;

/// Orders work packages for display: open (reversed), then closed.
pub fn order_for_display(items: &[WorkItem]) -> Vec<&WorkItem> {
    let (closed, open): (Vec<&WorkItem>, Vec<&WorkItem>) =
        items.iter().partition(|item| item.closed);
    open.into_iter().rev().chain(closed).collect()
}

/// Orders a project cluster's work packages, hiding items that have children.
///
/// Clustered listings show leaf work only; parents are represented by their
/// children.
pub fn order_cluster_for_display(items: &[WorkItem]) -> Vec<&WorkItem> {
    let (closed, open): (Vec<&WorkItem>, Vec<&WorkItem>) = items
        .iter()
        .filter(|item| !item.has_children)
        .partition(|item| item.closed);
    open.into_iter().rev().chain(closed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectId, StatusId};
    use crate::work_item::Hours;

    fn item(subject: &str, closed: bool, has_children: bool) -> WorkItem {
        WorkItem {
            id: 1,
            subject: subject.to_string(),
            project_id: ProjectId::new("1").unwrap(),
            project_title: "Project".to_string(),
            status_id: StatusId::new(if closed { "10" } else { "1" }).unwrap(),
            closed,
            href: String::new(),
            hours: Hours::default(),
            story_points: None,
            has_children,
            assignee_name: None,
            lock_version: None,
        }
    }

    fn subjects(items: &[&WorkItem]) -> Vec<String> {
        items.iter().map(|i| i.subject.clone()).collect()
    }

    #[test]
    fn open_items_are_reversed_before_closed() {
        let items = vec![
            item("O1", false, false),
            item("O2", false, false),
            item("C1", true, false),
        ];
        assert_eq!(subjects(&order_for_display(&items)), vec!["O2", "O1", "C1"]);
    }

    #[test]
    fn closed_items_keep_input_order() {
        let items = vec![
            item("C1", true, false),
            item("O1", false, false),
            item("C2", true, false),
            item("O2", false, false),
            item("O3", false, false),
        ];
        assert_eq!(
            subjects(&order_for_display(&items)),
            vec!["O3", "O2", "O1", "C1", "C2"]
        );
    }

    #[test]
    fn cluster_order_hides_parents() {
        let items = vec![
            item("Epic", false, true),
            item("O1", false, false),
            item("C1", true, false),
            item("O2", false, false),
        ];
        assert_eq!(
            subjects(&order_cluster_for_display(&items)),
            vec!["O2", "O1", "C1"]
        );
        assert_eq!(order_for_display(&items).len(), 4);
    }

    #[test]
    fn empty_list_stays_empty() {
        assert!(order_for_display(&[]).is_empty());
    }
}
