//! Calendar window computation for activity reports.
//!
//! A report window is the UTC calendar day, week, or month containing a
//! reference instant. Windows are half-open `[start, end)`, so an instant at
//! the very end of a day (23:59:59.999…) belongs to that day and never to
//! the next.
//!
//! Week convention: weeks start on **Sunday** at 00:00:00 UTC. The service
//! carries no per-user timezone, so all windows are UTC calendar windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::models::ReportPeriod;

/// Half-open UTC time window `[start, end)` for a report period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Compute the calendar window of `period` containing `reference`.
    pub fn containing(period: ReportPeriod, reference: DateTime<Utc>) -> Self {
        let date = reference.date_naive();
        match period {
            ReportPeriod::Daily => {
                let start = start_of(date);
                Self {
                    start,
                    end: start + Duration::days(1),
                }
            }
            ReportPeriod::Weekly => {
                let days_from_sunday = date.weekday().num_days_from_sunday() as i64;
                let start = start_of(date - Duration::days(days_from_sunday));
                Self {
                    start,
                    end: start + Duration::days(7),
                }
            }
            ReportPeriod::Monthly => {
                let start = start_of(date.with_day(1).expect("day 1 is always valid"));
                let next_month = if date.month() == 12 {
                    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
                }
                .expect("first of month is always valid");
                Self {
                    start,
                    end: start_of(next_month),
                }
            }
        }
    }

    /// Whether `instant` falls inside this window (start inclusive, end
    /// exclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Midnight UTC at the start of `date`.
fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
}
