//! Hour and story point rollups over enriched work packages.

use serde::Serialize;

use crate::work_item::WorkItem;

/// Accumulated estimated and remaining hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HourSums {
    pub estimated: f64,
    pub remaining: f64,
}

impl HourSums {
    fn add(&mut self, estimated: f64, remaining: f64) {
        self.estimated += estimated;
        self.remaining += remaining;
    }

    fn merge(&mut self, other: Self) {
        self.add(other.estimated, other.remaining);
    }
}

/// Totals over a set of work packages.
///
/// `total` always equals `open + closed`, field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RollupTotals {
    pub open: HourSums,
    pub closed: HourSums,
    pub total: HourSums,
    /// Remaining effort of open leaf items (see [`WorkItem::leaf_effort`]).
    pub nochildren: f64,
    /// Story points of every item, open or closed, parent or leaf.
    pub story_points: f64,
}

impl RollupTotals {
    /// Folds one work package into the totals.
    pub fn add(&mut self, item: &WorkItem) {
        let partition = if item.closed {
            &mut self.closed
        } else {
            &mut self.open
        };
        partition.add(item.hours.estimated, item.hours.remaining);
        self.total.add(item.hours.estimated, item.hours.remaining);

        if !item.has_children && !item.closed {
            self.nochildren += item.leaf_effort();
        }
        self.story_points += item.story_points.unwrap_or(0.0);
    }

    /// Combines totals computed over disjoint sets of work packages.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.open.merge(other.open);
        self.closed.merge(other.closed);
        self.total.merge(other.total);
        self.nochildren += other.nochildren;
        self.story_points += other.story_points;
        self
    }

    /// Hours already spent on open work packages.
    pub fn open_completed(&self) -> f64 {
        self.open.estimated - self.open.remaining
    }
}

/// Summarizes a set of work packages.
pub fn summarize<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> RollupTotals {
    let mut totals = RollupTotals::default();
    for item in items {
        totals.add(item);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectId, StatusId};
    use crate::work_item::Hours;
    use proptest::prelude::*;

    fn item(
        closed: bool,
        has_children: bool,
        estimated: f64,
        remaining: f64,
        story_points: Option<f64>,
    ) -> WorkItem {
        WorkItem {
            id: 1,
            subject: "Task".to_string(),
            project_id: ProjectId::new("1").unwrap(),
            project_title: "Project".to_string(),
            status_id: StatusId::new(if closed { "10" } else { "1" }).unwrap(),
            closed,
            href: "https://op.example.com/work_packages/1".to_string(),
            hours: Hours {
                estimated,
                derived_estimated: 0.0,
                remaining,
            },
            story_points,
            has_children,
            assignee_name: None,
            lock_version: None,
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(summarize(&[] as &[WorkItem]), RollupTotals::default());
    }

    #[test]
    fn nochildren_uses_one_unit_per_item() {
        let items = vec![
            item(false, false, 0.0, 0.0, Some(3.0)),
            item(false, false, 4.0, 2.0, None),
            item(false, true, 0.0, 5.0, None),
        ];
        let totals = summarize(&items);
        assert_eq!(totals.nochildren, 5.0);
    }

    #[test]
    fn nochildren_ignores_closed_items() {
        let items = vec![
            item(true, false, 4.0, 1.0, Some(8.0)),
            item(false, false, 2.0, 2.0, Some(8.0)),
        ];
        assert_eq!(summarize(&items).nochildren, 2.0);
    }

    #[test]
    fn story_points_count_every_item() {
        let items = vec![
            item(true, false, 0.0, 0.0, Some(2.0)),
            item(false, true, 0.0, 0.0, Some(3.0)),
            item(false, false, 0.0, 0.0, None),
        ];
        assert_eq!(summarize(&items).story_points, 5.0);
    }

    #[test]
    fn partitions_follow_closed_flag() {
        let items = vec![
            item(false, false, 4.0, 3.0, None),
            item(true, false, 2.0, 0.0, None),
        ];
        let totals = summarize(&items);
        assert_eq!(totals.open, HourSums { estimated: 4.0, remaining: 3.0 });
        assert_eq!(totals.closed, HourSums { estimated: 2.0, remaining: 0.0 });
        assert_eq!(totals.total, HourSums { estimated: 6.0, remaining: 3.0 });
        assert_eq!(totals.open_completed(), 1.0);
    }

    #[test]
    fn merge_matches_single_pass() {
        let items = vec![
            item(false, false, 4.0, 3.0, Some(1.0)),
            item(true, false, 2.0, 0.0, Some(2.0)),
            item(false, false, 0.0, 0.0, Some(5.0)),
        ];
        let (left, right) = items.split_at(1);
        assert_eq!(summarize(left).merge(summarize(right)), summarize(&items));
    }

    fn arb_item() -> impl Strategy<Value = WorkItem> {
        (
            any::<bool>(),
            any::<bool>(),
            0u32..200,
            0u32..200,
            proptest::option::of(0u32..40),
        )
            .prop_map(|(closed, has_children, est, rem, sp)| {
                // Quarter hours keep sums exact in binary floating point.
                item(
                    closed,
                    has_children,
                    f64::from(est) / 4.0,
                    f64::from(rem) / 4.0,
                    sp.map(f64::from),
                )
            })
    }

    proptest! {
        #[test]
        fn prop_total_is_open_plus_closed(items in proptest::collection::vec(arb_item(), 0..50)) {
            let totals = summarize(&items);
            prop_assert_eq!(totals.total.estimated, totals.open.estimated + totals.closed.estimated);
            prop_assert_eq!(totals.total.remaining, totals.open.remaining + totals.closed.remaining);
        }
    }
}
