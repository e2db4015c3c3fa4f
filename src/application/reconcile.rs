//! Reconciliation planning for a parent entity's ordered child collections.
//!
//! Updates to news and project galleries supply a keep-set of surviving
//! child URLs plus freshly uploaded children. The plan splits the existing
//! rows into survivors (original relative order preserved) and removals, and
//! appends the new children after the survivors, so position 0 stays the
//! cover.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildPlan {
    /// Survivors, in their original relative order.
    pub keep: Vec<String>,
    /// Existing children absent from the keep-set; their backing resources
    /// are released after the row changes commit.
    pub remove: Vec<String>,
    /// New children, appended after the survivors in caller order.
    pub insert: Vec<String>,
}

impl ChildPlan {
    /// Final ordered child list: survivors first, then insertions.
    pub fn final_order(&self) -> Vec<String> {
        self.keep
            .iter()
            .chain(self.insert.iter())
            .cloned()
            .collect()
    }

    pub fn is_unchanged(&self) -> bool {
        self.remove.is_empty() && self.insert.is_empty()
    }
}

/// An empty keep-set removes every existing child; that is the documented
/// contract, not an omission to second-guess.
pub fn plan_children(existing: &[String], keep_set: &[String], incoming: &[String]) -> ChildPlan {
    let keep_lookup: HashSet<&str> = keep_set.iter().map(String::as_str).collect();

    let mut keep = Vec::new();
    let mut remove = Vec::new();
    for url in existing {
        if keep_lookup.contains(url.as_str()) {
            keep.push(url.clone());
        } else {
            remove.push(url.clone());
        }
    }

    ChildPlan {
        keep,
        remove,
        insert: incoming.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn survivors_keep_relative_order_and_new_children_append() {
        let plan = plan_children(&urls(&["a", "b", "c"]), &urls(&["c", "a"]), &urls(&["d"]));

        assert_eq!(plan.keep, urls(&["a", "c"]));
        assert_eq!(plan.remove, urls(&["b"]));
        assert_eq!(plan.insert, urls(&["d"]));
        assert_eq!(plan.final_order(), urls(&["a", "c", "d"]));
    }

    #[test]
    fn empty_keep_set_removes_everything() {
        let plan = plan_children(&urls(&["a", "b"]), &[], &[]);
        assert!(plan.keep.is_empty());
        assert_eq!(plan.remove, urls(&["a", "b"]));
        assert!(plan.final_order().is_empty());
    }

    #[test]
    fn keep_entries_not_present_in_existing_are_ignored() {
        let plan = plan_children(&urls(&["a"]), &urls(&["a", "ghost"]), &[]);
        assert_eq!(plan.keep, urls(&["a"]));
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn untouched_collection_is_reported_unchanged() {
        let plan = plan_children(&urls(&["a", "b"]), &urls(&["a", "b"]), &[]);
        assert!(plan.is_unchanged());
        assert_eq!(plan.final_order(), urls(&["a", "b"]));
    }
}
