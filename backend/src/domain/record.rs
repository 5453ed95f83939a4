//! The persisted outcome of a resolved scan attempt.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::scan::{ScanCode, ScreenContext};

/// Validation errors raised by [`RecordEntry`] constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordValidationError {
    /// One of the scanned codes was empty.
    #[error("record codes must not be empty")]
    EmptyCode,
    /// A divergent record arrived without an authorizer.
    #[error("divergent records must carry the authorizing login")]
    MissingAuthorizer,
    /// A divergent record arrived without a reason.
    #[error("divergent records must carry a reason")]
    MissingReason,
}

/// One immutable line of the append-only record log.
///
/// ## Invariants
/// - `transport` and `order` are sanitized, non-empty, identically
///   length-capped codes.
/// - `divergent == true` implies `authorized_by` and `reason` are present and
///   non-empty.
///
/// Entries are created exactly once per resolved attempt and never updated
/// or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntry {
    /// Wall-clock time the attempt was resolved.
    pub recorded_at: DateTime<Utc>,
    /// Login of the operator who performed the scan.
    pub operator: String,
    /// Screen the scan originated from.
    pub context: ScreenContext,
    /// First scanned code.
    #[schema(value_type = String, example = "XYZ1234567")]
    pub transport: ScanCode,
    /// Second scanned code.
    #[schema(value_type = String, example = "XYZ1234567")]
    pub order: ScanCode,
    /// Whether the entry was recorded through the override path.
    pub divergent: bool,
    /// Login of the supervisor or admin who authorized a divergence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_by: Option<String>,
    /// Free-text reason supplied with the authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RecordEntry {
    /// Build a non-divergent entry for a matching, previously unseen pair.
    pub fn accepted(
        recorded_at: DateTime<Utc>,
        operator: impl Into<String>,
        context: ScreenContext,
        transport: ScanCode,
        order: ScanCode,
    ) -> Result<Self, RecordValidationError> {
        if transport.is_empty() || order.is_empty() {
            return Err(RecordValidationError::EmptyCode);
        }
        Ok(Self {
            recorded_at,
            operator: operator.into(),
            context,
            transport,
            order,
            divergent: false,
            authorized_by: None,
            reason: None,
        })
    }

    /// Build a divergent entry carrying the authorizing login and reason.
    pub fn divergent(
        recorded_at: DateTime<Utc>,
        operator: impl Into<String>,
        context: ScreenContext,
        transport: ScanCode,
        order: ScanCode,
        authorized_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<Self, RecordValidationError> {
        if transport.is_empty() || order.is_empty() {
            return Err(RecordValidationError::EmptyCode);
        }
        let authorized_by = authorized_by.into();
        if authorized_by.trim().is_empty() {
            return Err(RecordValidationError::MissingAuthorizer);
        }
        let reason = reason.into().trim().to_owned();
        if reason.is_empty() {
            return Err(RecordValidationError::MissingReason);
        }
        Ok(Self {
            recorded_at,
            operator: operator.into(),
            context,
            transport,
            order,
            divergent: true,
            authorized_by: Some(authorized_by),
            reason: Some(reason),
        })
    }
}

/// Export filter over the record log.
///
/// The range is inclusive on whole days: entries from the start of `from` up
/// to the end of `to` match. Re-running the same query against an unchanged
/// log yields the same result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordQuery {
    /// First day of the range.
    pub from: NaiveDate,
    /// Last day of the range.
    pub to: NaiveDate,
    /// Restrict to one screen context, or `None` for all.
    pub context: Option<ScreenContext>,
    /// Keep only divergent entries.
    pub divergent_only: bool,
}

impl RecordQuery {
    /// Inclusive lower bound: start of the first day.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound: start of the day after the last day.
    pub fn ends_before(&self) -> DateTime<Utc> {
        self.to
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    /// Whether an entry falls inside this filter.
    pub fn matches(&self, entry: &RecordEntry) -> bool {
        if entry.recorded_at < self.starts_at() || entry.recorded_at >= self.ends_before() {
            return false;
        }
        if let Some(context) = self.context {
            if entry.context != context {
                return false;
            }
        }
        if self.divergent_only && !entry.divergent {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn code(raw: &str) -> ScanCode {
        ScanCode::sanitize(raw)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn accepted_entries_have_no_authorization_fields() {
        let entry = RecordEntry::accepted(
            at(2026, 8, 1, 9),
            "maria.s",
            ScreenContext::Single,
            code("XYZ1234567"),
            code("XYZ1234567"),
        )
        .expect("valid entry");
        assert!(!entry.divergent);
        assert!(entry.authorized_by.is_none());
        assert!(entry.reason.is_none());
    }

    #[test]
    fn empty_codes_are_rejected() {
        let err = RecordEntry::accepted(
            at(2026, 8, 1, 9),
            "maria.s",
            ScreenContext::Single,
            code("---"),
            code("XYZ"),
        )
        .expect_err("empty transport must fail");
        assert_eq!(err, RecordValidationError::EmptyCode);
    }

    #[rstest]
    #[case("", "label swapped", RecordValidationError::MissingAuthorizer)]
    #[case("chief", "   ", RecordValidationError::MissingReason)]
    fn divergent_entries_require_authorizer_and_reason(
        #[case] authorizer: &str,
        #[case] reason: &str,
        #[case] expected: RecordValidationError,
    ) {
        let err = RecordEntry::divergent(
            at(2026, 8, 1, 9),
            "maria.s",
            ScreenContext::Single,
            code("AAA1111111"),
            code("BBB2222222"),
            authorizer,
            reason,
        )
        .expect_err("invalid divergent entry must fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn divergent_reasons_are_trimmed() {
        let entry = RecordEntry::divergent(
            at(2026, 8, 1, 9),
            "maria.s",
            ScreenContext::Single,
            code("AAA1111111"),
            code("BBB2222222"),
            "chief",
            "  label swapped  ",
        )
        .expect("valid divergent entry");
        assert_eq!(entry.reason.as_deref(), Some("label swapped"));
        assert_eq!(entry.authorized_by.as_deref(), Some("chief"));
        assert!(entry.divergent);
    }

    fn sample_query() -> RecordQuery {
        RecordQuery {
            from: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            to: NaiveDate::from_ymd_opt(2026, 8, 3).expect("valid date"),
            context: None,
            divergent_only: false,
        }
    }

    #[rstest]
    #[case(at(2026, 8, 1, 0), true)]
    #[case(at(2026, 8, 3, 23), true)]
    #[case(at(2026, 7, 31, 23), false)]
    #[case(at(2026, 8, 4, 0), false)]
    fn query_bounds_are_whole_days_inclusive(
        #[case] recorded_at: DateTime<Utc>,
        #[case] expected: bool,
    ) {
        let entry = RecordEntry::accepted(
            recorded_at,
            "maria.s",
            ScreenContext::Single,
            code("XYZ1234567"),
            code("XYZ1234567"),
        )
        .expect("valid entry");
        assert_eq!(sample_query().matches(&entry), expected);
    }

    #[test]
    fn query_filters_by_context_and_divergence() {
        let entry = RecordEntry::accepted(
            at(2026, 8, 2, 12),
            "maria.s",
            ScreenContext::Batch,
            code("XYZ1234567"),
            code("XYZ1234567"),
        )
        .expect("valid entry");

        let mut query = sample_query();
        query.context = Some(ScreenContext::Single);
        assert!(!query.matches(&entry));

        query.context = Some(ScreenContext::Batch);
        assert!(query.matches(&entry));

        query.divergent_only = true;
        assert!(!query.matches(&entry));
    }
}
