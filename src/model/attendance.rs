use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Closed set of daily statuses. The wire and storage form is the
/// human-readable label ("Half Day", not "half_day").
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "Present")]
    #[sqlx(rename = "Present")]
    #[strum(serialize = "Present")]
    Present,

    #[serde(rename = "Absent")]
    #[sqlx(rename = "Absent")]
    #[strum(serialize = "Absent")]
    Absent,

    #[serde(rename = "Half Day")]
    #[sqlx(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,

    #[serde(rename = "Work From Home")]
    #[sqlx(rename = "Work From Home")]
    #[strum(serialize = "Work From Home")]
    WorkFromHome,

    #[serde(rename = "Paid Leave")]
    #[sqlx(rename = "Paid Leave")]
    #[strum(serialize = "Paid Leave")]
    PaidLeave,

    #[serde(rename = "Sick Leave")]
    #[sqlx(rename = "Sick Leave")]
    #[strum(serialize = "Sick Leave")]
    SickLeave,

    #[serde(rename = "Casual Leave")]
    #[sqlx(rename = "Casual Leave")]
    #[strum(serialize = "Casual Leave")]
    CasualLeave,
}

impl AttendanceStatus {
    /// Counted toward the attendance rate.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present | AttendanceStatus::HalfDay | AttendanceStatus::WorkFromHome
        )
    }

    pub fn is_leave(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::PaidLeave | AttendanceStatus::SickLeave | AttendanceStatus::CasualLeave
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = 1)]
    pub employee_id: i64,

    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "Half day for a doctor visit", nullable = true)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_labels_round_trip() {
        for (status, label) in [
            (AttendanceStatus::Present, "Present"),
            (AttendanceStatus::HalfDay, "Half Day"),
            (AttendanceStatus::WorkFromHome, "Work From Home"),
            (AttendanceStatus::PaidLeave, "Paid Leave"),
        ] {
            assert_eq!(status.to_string(), label);
            assert_eq!(AttendanceStatus::from_str(label).unwrap(), status);
        }
    }

    #[test]
    fn working_and_leave_are_disjoint() {
        use strum::IntoEnumIterator;

        for status in AttendanceStatus::iter() {
            assert!(!(status.is_working() && status.is_leave()));
        }
        assert!(AttendanceStatus::HalfDay.is_working());
        assert!(AttendanceStatus::CasualLeave.is_leave());
        assert!(!AttendanceStatus::Absent.is_working());
        assert!(!AttendanceStatus::Absent.is_leave());
    }
}
