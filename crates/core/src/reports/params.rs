//! Validated request parameters shared by report entry points.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::period::parse_date;
use crate::records::ParticipationType;
use crate::types::{Date, Timestamp};

/// Inclusive calendar date range, matched against timestamps as the
/// half-open interval `[from 00:00, to + 1 day 00:00)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Date,
    pub to: Date,
}

impl DateRange {
    pub fn new(from: Date, to: Date) -> Result<Self, CoreError> {
        if from > to {
            return Err(CoreError::Validation(
                "'To' Date should be after 'From' Date".into(),
            ));
        }
        Ok(Self { from, to })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self, CoreError> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    pub fn start(&self) -> Timestamp {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight after `to`; saturates at the last representable instant.
    pub fn end_exclusive(&self) -> Timestamp {
        match self.to.succ_opt() {
            Some(next) => next.and_time(NaiveTime::MIN).and_utc(),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start() <= ts && ts < self.end_exclusive()
    }
}

/// `None` means no time restriction.
pub fn within(range: Option<&DateRange>, ts: Timestamp) -> bool {
    range.map_or(true, |r| r.contains(ts))
}

/// Parses participation type codes; each must be 1, 2, 3 or 4.
pub fn parse_participation_types(codes: &[i16]) -> Result<Vec<ParticipationType>, CoreError> {
    codes.iter().map(|c| ParticipationType::try_from(*c)).collect()
}

/// Requested sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

impl SortSpec {
    /// Uses `default` when no column was requested and rejects columns that
    /// are not in `allowed`.
    pub fn resolve(
        requested: Option<&str>,
        descending: bool,
        default: &str,
        allowed: &[&str],
    ) -> Result<Self, CoreError> {
        let column = requested.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(default);
        if !allowed.contains(&column) {
            return Err(CoreError::Validation(format!(
                "Invalid sort column '{column}'. Must be one of: {}",
                allowed.join(", ")
            )));
        }
        Ok(Self {
            column: column.to_owned(),
            descending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::date;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    #[test]
    fn to_before_from_rejected() {
        let err = DateRange::parse("2024-02-10", "2024-02-01").unwrap_err();
        assert_matches!(err, CoreError::Validation(m) if m == "'To' Date should be after 'From' Date");
    }

    #[test]
    fn unparseable_date_rejected() {
        assert_matches!(DateRange::parse("2024-13-01", "2024-12-01"), Err(CoreError::Validation(_)));
        assert_matches!(DateRange::parse("yesterday", "2024-12-01"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn range_includes_whole_end_day() {
        let r = DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        assert!(r.contains(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert!(r.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn range_ending_on_last_calendar_day_saturates() {
        let last = chrono::NaiveDate::MAX;
        let r = DateRange::new(last, last).unwrap();
        assert_eq!(r.end_exclusive(), DateTime::<Utc>::MAX_UTC);
        assert!(r.contains(last.and_time(NaiveTime::MIN).and_utc()));
    }

    #[test]
    fn participation_types_validated() {
        assert_eq!(
            parse_participation_types(&[1, 4]).unwrap(),
            vec![ParticipationType::FullTime, ParticipationType::ContractBasis]
        );
        assert_matches!(parse_participation_types(&[1, 5]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn sort_spec_defaults_and_validates() {
        let spec = SortSpec::resolve(None, false, "A", &["A", "B"]).unwrap();
        assert_eq!(spec.column, "A");
        let spec = SortSpec::resolve(Some("B"), true, "A", &["A", "B"]).unwrap();
        assert!(spec.descending);
        assert_matches!(
            SortSpec::resolve(Some("C"), false, "A", &["A", "B"]),
            Err(CoreError::Validation(_))
        );
    }
}
