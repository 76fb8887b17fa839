// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Time-window bucketing of event timestamps.
//!
//! Bucket labels sort lexicographically in time order within a window, so a `BTreeMap` keyed
//! by label is already a time series ready for [`rollup_latest`](crate::aggregation::rollup_latest).

use crate::traits::SketchError;
use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1m")]
    Minute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1M")]
    Month,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 7] = [
        TimeWindow::Minute,
        TimeWindow::FiveMinutes,
        TimeWindow::FifteenMinutes,
        TimeWindow::Hour,
        TimeWindow::Day,
        TimeWindow::Week,
        TimeWindow::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Minute => "1m",
            TimeWindow::FiveMinutes => "5m",
            TimeWindow::FifteenMinutes => "15m",
            TimeWindow::Hour => "1h",
            TimeWindow::Day => "1d",
            TimeWindow::Week => "1w",
            TimeWindow::Month => "1M",
        }
    }

    /// Nominal width of the window. A month counts as 30 days.
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Minute => Duration::minutes(1),
            TimeWindow::FiveMinutes => Duration::minutes(5),
            TimeWindow::FifteenMinutes => Duration::minutes(15),
            TimeWindow::Hour => Duration::hours(1),
            TimeWindow::Day => Duration::days(1),
            TimeWindow::Week => Duration::weeks(1),
            TimeWindow::Month => Duration::days(30),
        }
    }

    /// Label of the bucket containing `ts`.
    pub fn bucket(&self, ts: DateTime<Utc>) -> String {
        match self {
            TimeWindow::Minute => ts.format("%Y-%m-%dT%H:%M:00").to_string(),
            TimeWindow::FiveMinutes => Self::floored(ts, 5),
            TimeWindow::FifteenMinutes => Self::floored(ts, 15),
            TimeWindow::Hour => ts.format("%Y-%m-%dT%H:00:00").to_string(),
            TimeWindow::Day => ts.format("%Y-%m-%d").to_string(),
            TimeWindow::Week => {
                let week = ts.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TimeWindow::Month => ts.format("%Y-%m").to_string(),
        }
    }

    fn floored(ts: DateTime<Utc>, step: u32) -> String {
        format!(
            "{}T{:02}:{:02}:00",
            ts.format("%Y-%m-%d"),
            ts.hour(),
            ts.minute() / step * step
        )
    }

    /// Labels of the `count` buckets ending at `end`, newest first.
    ///
    /// Months step back by calendar month; the other windows step by [`duration`](Self::duration).
    pub fn buckets_back(&self, end: DateTime<Utc>, count: usize) -> Vec<String> {
        let mut buckets = Vec::with_capacity(count);
        for i in 0..count {
            let ts = match self {
                TimeWindow::Month => end.checked_sub_months(Months::new(i as u32)),
                _ => i32::try_from(i)
                    .ok()
                    .and_then(|i| self.duration().checked_mul(i))
                    .and_then(|back| end.checked_sub_signed(back)),
            };
            match ts {
                Some(ts) => buckets.push(self.bucket(ts)),
                // Ran off the representable calendar.
                None => break,
            }
        }
        buckets
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeWindow::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| {
                SketchError::InvalidInput(format!(
                    "Invalid window: {}. Valid options: 1m, 5m, 15m, 1h, 1d, 1w, 1M",
                    s
                ))
            })
    }
}
