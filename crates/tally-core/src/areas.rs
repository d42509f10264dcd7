//! The universe of areas a snapshot day is broken down by.

use std::collections::BTreeSet;

use crate::model::Issue;

/// Distinct area labels across `issues`, plus the synthetic `all_label`.
#[must_use]
pub fn unique_areas(issues: &[Issue], all_label: &str) -> BTreeSet<String> {
    let mut areas: BTreeSet<String> = issues
        .iter()
        .flat_map(|issue| issue.areas.iter().cloned())
        .collect();
    areas.insert(all_label.to_string());
    areas
}

/// Areas one issue counts toward: its own (deduplicated) plus `all_label`.
///
/// An issue with no areas counts toward `all_label` only.
#[must_use]
pub fn areas_to_update<'a>(issue: &'a Issue, all_label: &'a str) -> Vec<&'a str> {
    let mut targets: Vec<&str> = issue.areas.iter().map(String::as_str).collect();
    targets.push(all_label);
    targets.sort_unstable();
    targets.dedup();
    targets
}

/// Dense, ordered index over [`unique_areas`].
///
/// The accumulator keeps one counter row per position, so lookups during
/// the day loop are plain slice indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaIndex {
    labels: Vec<String>,
    all_position: usize,
}

impl AreaIndex {
    #[must_use]
    pub fn from_issues(issues: &[Issue], all_label: &str) -> Self {
        Self::from_labels(unique_areas(issues, all_label), all_label)
    }

    /// Build from an explicit label set; `all_label` is added if missing.
    #[must_use]
    pub fn from_labels(labels: BTreeSet<String>, all_label: &str) -> Self {
        let mut labels = labels;
        labels.insert(all_label.to_string());
        let labels: Vec<String> = labels.into_iter().collect();
        let all_position = labels
            .binary_search_by(|label| label.as_str().cmp(all_label))
            .unwrap_or_default();
        Self {
            labels,
            all_position,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn all_label(&self) -> &str {
        &self.labels[self.all_position]
    }

    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|candidate| candidate.as_str().cmp(label))
            .ok()
    }

    /// Counter positions `issue` contributes to.
    ///
    /// Areas unknown to the index are skipped; with an index built from the
    /// same issue list that never happens.
    #[must_use]
    pub fn targets_for(&self, issue: &Issue) -> Vec<usize> {
        let mut targets: Vec<usize> = issue
            .areas
            .iter()
            .filter_map(|area| self.position(area))
            .collect();
        targets.push(self.all_position);
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}
