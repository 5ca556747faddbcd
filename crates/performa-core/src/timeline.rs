//! Month-indexed calendar over which every cash flow in a deal is aligned.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PerformaError, PerformaResult};

/// A calendar year/month pair, always normalized to the 1st of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Construct a `YearMonth`. `month` is 1-indexed (January = 1).
    pub fn new(year: i32, month: u32) -> PerformaResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PerformaError::config(format!(
                "month must be in 1..=12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The year component.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The 1-indexed month component.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The `YearMonth` that follows this one by exactly one calendar month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The `YearMonth` `n` months after this one.
    pub fn advance(&self, n: usize) -> Self {
        let total = (self.year as i64) * 12 + (self.month as i64 - 1) + n as i64;
        let year = (total.div_euclid(12)) as i32;
        let month = (total.rem_euclid(12) + 1) as u32;
        Self { year, month }
    }

    /// Whole-month distance from `self` to `other` (can be negative).
    pub fn months_until(&self, other: &Self) -> i64 {
        let a = (self.year as i64) * 12 + self.month as i64;
        let b = (other.year as i64) * 12 + other.month as i64;
        b - a
    }

    /// Render as the first calendar day of the month.
    pub fn as_naive_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth invariants guarantee a valid calendar date")
    }

    /// Construct from any `NaiveDate`, truncating to the 1st of its month.
    pub fn from_naive_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Closed interval of consecutive calendar months `[start, start + length)`,
/// the governing index for every `CashFlowSeries` in an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    start_month: YearMonth,
    length: usize,
}

impl Timeline {
    /// Build a timeline starting at `start_month` spanning `length` months.
    ///
    /// `length` must be at least 1.
    pub fn new(start_month: YearMonth, length: usize) -> PerformaResult<Self> {
        if length == 0 {
            return Err(PerformaError::config("timeline length must be >= 1"));
        }
        Ok(Self {
            start_month,
            length,
        })
    }

    /// The first month of the timeline.
    pub fn start_month(&self) -> YearMonth {
        self.start_month
    }

    /// The number of months spanned by the timeline.
    pub fn length(&self) -> usize {
        self.length
    }

    /// The months of the timeline, strictly increasing by one month each.
    pub fn months(&self) -> Vec<YearMonth> {
        (0..self.length).map(|i| self.start_month.advance(i)).collect()
    }

    /// The index of `month` within the timeline, or `None` if it falls
    /// outside `[start, start + length)`.
    pub fn index_of(&self, month: YearMonth) -> Option<usize> {
        let offset = self.start_month.months_until(&month);
        if offset < 0 || offset as usize >= self.length {
            None
        } else {
            Some(offset as usize)
        }
    }

    /// The index of `month`, erroring if it falls outside the timeline.
    pub fn require_index_of(&self, month: YearMonth) -> PerformaResult<usize> {
        self.index_of(month)
            .ok_or_else(|| PerformaError::out_of_timeline(month.to_string()))
    }

    /// The last month covered by the timeline (inclusive).
    pub fn end_month(&self) -> YearMonth {
        self.start_month.advance(self.length - 1)
    }

    /// Zero-fill and re-index a sparse set of `(YearMonth, value)` pairs onto
    /// this timeline's index space, summing values that share a month.
    /// Pairs outside the timeline's domain are dropped.
    pub fn align(&self, values: impl IntoIterator<Item = (YearMonth, f64)>) -> Vec<f64> {
        let mut aligned = vec![0.0; self.length];
        for (month, value) in values {
            if let Some(idx) = self.index_of(month) {
                aligned[idx] += value;
            }
        }
        aligned
    }
}
