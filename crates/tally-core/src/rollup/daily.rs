//! Membership predicates for one issue on one snapshot day.
//!
//! All comparisons happen on UTC calendar days. "Open on day `d`" means the
//! issue existed by the end of `d` and had not been closed by the end of
//! `d`, so an issue closed during `d` is already closed on `d`.

use chrono::{Datelike, NaiveDate};

use crate::areas::AreaIndex;
use crate::config::RollupConfig;
use crate::model::{AgeBucket, AreaSnapshotRollup, Issue};

/// Day number used by the inner loop.
pub type DayNumber = i32;

#[must_use]
pub fn day_number(day: NaiveDate) -> DayNumber {
    day.num_days_from_ce()
}

/// Everything the rollup needs to know about an issue on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyFacts {
    pub is_open: bool,
    /// Open and not parked in the backlog milestone.
    pub is_triaged_open: bool,
    /// Open with no milestone at all.
    pub is_untriaged: bool,
    /// Backlog milestone and *currently* open. Uses the live state, not
    /// `is_open`, so historical days report today's backlog membership.
    pub is_backlog: bool,
    pub opened_in_window: bool,
    pub closed_in_window: bool,
    /// `None` when the day precedes creation.
    pub age_bucket: Option<AgeBucket>,
}

/// An issue reduced to the integers and flags the day loop compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueProfile {
    created: DayNumber,
    closed: Option<DayNumber>,
    has_milestone: bool,
    in_backlog_milestone: bool,
    live_open: bool,
    targets: Vec<usize>,
}

impl IssueProfile {
    /// Precompute the profile; `index` resolves the issue's target rows.
    #[must_use]
    pub fn new(issue: &Issue, index: &AreaIndex, config: &RollupConfig) -> Self {
        Self {
            created: day_number(issue.created_day()),
            closed: issue.closed_day().map(day_number),
            has_milestone: issue.milestone.is_some(),
            in_backlog_milestone: issue.has_milestone(&config.backlog_milestone),
            live_open: issue.is_open(),
            targets: index.targets_for(issue),
        }
    }

    #[must_use]
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Evaluate every predicate for `day` with a trailing window of
    /// `window_days` days, i.e. the half-open range `(day - window, day]`.
    #[must_use]
    pub fn facts_on(&self, day: DayNumber, window_days: DayNumber) -> DailyFacts {
        let is_open = self.created <= day && self.closed.is_none_or(|closed| closed > day);
        let window_start = day - window_days;
        let in_window = |at: DayNumber| at > window_start && at <= day;

        DailyFacts {
            is_open,
            is_triaged_open: is_open && !self.in_backlog_milestone,
            is_untriaged: is_open && !self.has_milestone,
            is_backlog: self.in_backlog_milestone && self.live_open,
            opened_in_window: in_window(self.created),
            closed_in_window: self.closed.is_some_and(in_window),
            age_bucket: AgeBucket::for_age(i64::from(day - self.created)),
        }
    }

    /// Add this issue's contribution for `day` into `rows`.
    pub fn accumulate(&self, day: DayNumber, window_days: DayNumber, rows: &mut [AreaSnapshotRollup]) {
        let facts = self.facts_on(day, window_days);
        apply(&facts, &self.targets, rows);
    }
}

/// Evaluate the predicates for a single issue and calendar day.
#[must_use]
pub fn evaluate(issue: &Issue, day: NaiveDate, config: &RollupConfig) -> DailyFacts {
    let index = AreaIndex::from_labels(Default::default(), &config.all_areas_label);
    IssueProfile::new(issue, &index, config).facts_on(day_number(day), window(config))
}

/// Increment every target row according to `facts`.
pub fn apply(facts: &DailyFacts, targets: &[usize], rows: &mut [AreaSnapshotRollup]) {
    for &target in targets {
        let Some(record) = rows.get_mut(target) else {
            continue;
        };
        if facts.is_triaged_open {
            record.open += 1;
            if let Some(bucket) = facts.age_bucket {
                record.bump_bucket(bucket);
            }
        }
        if facts.is_backlog {
            record.backlog += 1;
        }
        if facts.is_untriaged {
            record.untriaged += 1;
        }
        if facts.opened_in_window {
            record.opened_last_30d += 1;
        }
        if facts.closed_in_window {
            record.closed_last_30d += 1;
        }
    }
}

/// The configured window as a day delta.
#[must_use]
pub fn window(config: &RollupConfig) -> DayNumber {
    DayNumber::try_from(config.window_days).unwrap_or(DayNumber::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueState, NO_PRIORITY};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn issue(created: NaiveDate, closed: Option<NaiveDate>, milestone: Option<&str>) -> Issue {
        let at = |day: NaiveDate| {
            Utc.from_utc_datetime(&day.and_hms_opt(15, 30, 0).expect("valid time"))
        };
        Issue {
            author: "octocat".into(),
            closed_at: closed.map(at),
            created_at: at(created),
            number: 1,
            state: if closed.is_some() {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            url: String::new(),
            title: String::new(),
            areas: vec!["Backend".into()],
            priority: NO_PRIORITY,
            issue_type: None,
            has_area: true,
            has_type: false,
            total_reactions: 0,
            comment_count: 0,
            milestone: milestone.map(str::to_string),
        }
    }

    #[test]
    fn untriaged_issue_mid_life() {
        let cfg = RollupConfig::default();
        let subject = issue(ymd(2024, 1, 1), Some(ymd(2024, 1, 10)), None);

        let facts = evaluate(&subject, ymd(2024, 1, 5), &cfg);
        assert!(facts.is_open);
        assert!(facts.is_triaged_open);
        assert!(facts.is_untriaged);
        assert!(!facts.is_backlog);
        assert!(facts.opened_in_window);
        assert!(!facts.closed_in_window);
        assert_eq!(facts.age_bucket, Some(AgeBucket::Days0To7));

        let after = evaluate(&subject, ymd(2024, 1, 15), &cfg);
        assert!(!after.is_open);
        assert!(!after.is_untriaged);
        assert!(after.closed_in_window);
    }

    #[test]
    fn closed_on_day_is_not_open_that_day() {
        let cfg = RollupConfig::default();
        let subject = issue(ymd(2024, 1, 1), Some(ymd(2024, 1, 10)), None);
        assert!(evaluate(&subject, ymd(2024, 1, 9), &cfg).is_open);
        assert!(!evaluate(&subject, ymd(2024, 1, 10), &cfg).is_open);
    }

    #[test]
    fn not_open_before_creation() {
        let cfg = RollupConfig::default();
        let subject = issue(ymd(2024, 1, 5), None, None);
        let facts = evaluate(&subject, ymd(2024, 1, 4), &cfg);
        assert!(!facts.is_open);
        assert!(!facts.opened_in_window);
        assert_eq!(facts.age_bucket, None);
    }

    #[test]
    fn windows_are_half_open_thirty_days() {
        let cfg = RollupConfig::default();
        let subject = issue(ymd(2024, 1, 1), Some(ymd(2024, 2, 1)), None);

        // 2024-01-30 is 29 days after creation: inside (d-30, d].
        assert!(evaluate(&subject, ymd(2024, 1, 30), &cfg).opened_in_window);
        // 2024-01-31 is exactly 30 days after: excluded.
        assert!(!evaluate(&subject, ymd(2024, 1, 31), &cfg).opened_in_window);

        assert!(evaluate(&subject, ymd(2024, 2, 1), &cfg).closed_in_window);
        assert!(evaluate(&subject, ymd(2024, 3, 1), &cfg).closed_in_window);
        assert!(!evaluate(&subject, ymd(2024, 3, 2), &cfg).closed_in_window);
        assert!(!evaluate(&subject, ymd(2024, 1, 31), &cfg).closed_in_window);
    }

    #[test]
    fn backlog_uses_live_state_not_snapshot_day() {
        let cfg = RollupConfig::default();
        let open_backlog = issue(ymd(2024, 3, 1), None, Some("Backlog"));

        // Before the issue even existed it already counts as backlog.
        let early = evaluate(&open_backlog, ymd(2024, 1, 1), &cfg);
        assert!(early.is_backlog);
        assert!(!early.is_open);

        // Open backlog issues are excluded from the triaged-open count.
        let later = evaluate(&open_backlog, ymd(2024, 3, 5), &cfg);
        assert!(later.is_open);
        assert!(!later.is_triaged_open);
        assert!(!later.is_untriaged);
        assert!(later.is_backlog);

        // A closed backlog issue never counts, even on days it was open.
        let closed_backlog = issue(ymd(2024, 3, 1), Some(ymd(2024, 4, 1)), Some("Backlog"));
        let mid = evaluate(&closed_backlog, ymd(2024, 3, 15), &cfg);
        assert!(mid.is_open);
        assert!(!mid.is_backlog);
    }

    #[test]
    fn milestone_other_than_backlog_is_triaged() {
        let cfg = RollupConfig::default();
        let subject = issue(ymd(2024, 1, 1), None, Some("v2.0"));
        let facts = evaluate(&subject, ymd(2024, 2, 15), &cfg);
        assert!(facts.is_triaged_open);
        assert!(!facts.is_untriaged);
        assert!(!facts.is_backlog);
        assert_eq!(facts.age_bucket, Some(AgeBucket::Days31To90));
    }

    #[test]
    fn backlog_sentinel_is_configurable() {
        let cfg = RollupConfig {
            backlog_milestone: "Someday".into(),
            ..RollupConfig::default()
        };
        let subject = issue(ymd(2024, 1, 1), None, Some("Someday"));
        assert!(evaluate(&subject, ymd(2024, 1, 2), &cfg).is_backlog);

        let default_name = issue(ymd(2024, 1, 1), None, Some("Backlog"));
        assert!(!evaluate(&default_name, ymd(2024, 1, 2), &cfg).is_backlog);
    }

    #[test]
    fn apply_bumps_every_target_row() {
        let facts = DailyFacts {
            is_open: true,
            is_triaged_open: true,
            is_untriaged: true,
            is_backlog: false,
            opened_in_window: true,
            closed_in_window: false,
            age_bucket: Some(AgeBucket::Days8To30),
        };
        let mut rows = vec![AreaSnapshotRollup::default(); 3];
        apply(&facts, &[0, 2], &mut rows);

        for row in [&rows[0], &rows[2]] {
            assert_eq!(row.open, 1);
            assert_eq!(row.untriaged, 1);
            assert_eq!(row.opened_last_30d, 1);
            assert_eq!(row.bucket_8_30, 1);
            assert_eq!(row.backlog, 0);
        }
        assert_eq!(rows[1], AreaSnapshotRollup::default());
    }

    proptest! {
        #[test]
        fn prop_open_exactly_between_created_and_closed(
            created_offset in 0i64..400,
            lifetime in 1i64..400,
            probe in -50i64..900,
        ) {
            let cfg = RollupConfig::default();
            let base = ymd(2022, 1, 1);
            let created = base + chrono::Duration::days(created_offset);
            let closed = created + chrono::Duration::days(lifetime);
            let day = base + chrono::Duration::days(probe);

            let facts = evaluate(&issue(created, Some(closed), None), day, &cfg);
            prop_assert_eq!(facts.is_open, day >= created && day < closed);
        }

        #[test]
        fn prop_every_nonnegative_age_has_one_bucket(age in 0i64..100_000) {
            let matching = AgeBucket::ALL
                .iter()
                .filter(|bucket| {
                    let (min, max) = bucket.range();
                    age >= min && max.is_none_or(|max| age <= max)
                })
                .count();
            prop_assert_eq!(matching, 1);
            prop_assert!(AgeBucket::for_age(age).is_some());
        }
    }
}
