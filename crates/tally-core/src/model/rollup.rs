use serde::{Deserialize, Serialize};
use std::fmt;

/// Age ranges for open issues, in whole days since creation.
///
/// The ranges are contiguous from 0 and the last one is unbounded, so every
/// non-negative age lands in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    Days0To7,
    Days8To30,
    Days31To90,
    Days91To180,
    Days181Plus,
}

impl AgeBucket {
    pub const ALL: [Self; 5] = [
        Self::Days0To7,
        Self::Days8To30,
        Self::Days31To90,
        Self::Days91To180,
        Self::Days181Plus,
    ];

    /// Inclusive `(min, max)` day range; `max` is `None` for the open-ended bucket.
    #[must_use]
    pub const fn range(self) -> (i64, Option<i64>) {
        match self {
            Self::Days0To7 => (0, Some(7)),
            Self::Days8To30 => (8, Some(30)),
            Self::Days31To90 => (31, Some(90)),
            Self::Days91To180 => (91, Some(180)),
            Self::Days181Plus => (181, None),
        }
    }

    /// Bucket containing `age_days`, or `None` for negative ages.
    #[must_use]
    pub fn for_age(age_days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| {
            let (min, max) = bucket.range();
            age_days >= min && max.is_none_or(|max| age_days <= max)
        })
    }

    /// Field name used in persisted rollup records.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Days0To7 => "bucket_0_7",
            Self::Days8To30 => "bucket_8_30",
            Self::Days31To90 => "bucket_31_90",
            Self::Days91To180 => "bucket_91_180",
            Self::Days181Plus => "bucket_180_plus",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Counters for one area on one snapshot day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSnapshotRollup {
    pub open: u64,
    pub untriaged: u64,
    pub backlog: u64,
    pub opened_last_30d: u64,
    pub closed_last_30d: u64,
    pub bucket_0_7: u64,
    pub bucket_8_30: u64,
    pub bucket_31_90: u64,
    pub bucket_91_180: u64,
    pub bucket_180_plus: u64,
}

impl AreaSnapshotRollup {
    pub const fn bump_bucket(&mut self, bucket: AgeBucket) {
        match bucket {
            AgeBucket::Days0To7 => self.bucket_0_7 += 1,
            AgeBucket::Days8To30 => self.bucket_8_30 += 1,
            AgeBucket::Days31To90 => self.bucket_31_90 += 1,
            AgeBucket::Days91To180 => self.bucket_91_180 += 1,
            AgeBucket::Days181Plus => self.bucket_180_plus += 1,
        }
    }

    #[must_use]
    pub const fn bucket(&self, bucket: AgeBucket) -> u64 {
        match bucket {
            AgeBucket::Days0To7 => self.bucket_0_7,
            AgeBucket::Days8To30 => self.bucket_8_30,
            AgeBucket::Days31To90 => self.bucket_31_90,
            AgeBucket::Days91To180 => self.bucket_91_180,
            AgeBucket::Days181Plus => self.bucket_180_plus,
        }
    }

    #[must_use]
    pub const fn bucket_total(&self) -> u64 {
        self.bucket_0_7
            + self.bucket_8_30
            + self.bucket_31_90
            + self.bucket_91_180
            + self.bucket_180_plus
    }
}

/// One persisted entry of the snapshot time series.
///
/// `date` stays a string so histories written by older tools round-trip
/// untouched; it is only parsed when the incremental path needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupRecord {
    pub date: String,
    pub area: String,
    #[serde(flatten)]
    pub counts: AreaSnapshotRollup,
}

impl RollupRecord {
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.date, &self.area)
    }
}
