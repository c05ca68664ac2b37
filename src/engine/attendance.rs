use serde::Serialize;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// One day's marks keyed by employee. A missing entry means "not yet
/// marked", which is deliberately distinct from `Absent`.
pub struct DailySnapshot<'a> {
    by_employee: HashMap<i64, &'a AttendanceRecord>,
}

impl<'a> DailySnapshot<'a> {
    pub fn new(records: &'a [AttendanceRecord]) -> Self {
        Self {
            by_employee: records.iter().map(|r| (r.employee_id, r)).collect(),
        }
    }

    pub fn record_for(&self, employee_id: i64) -> Option<&AttendanceRecord> {
        self.by_employee.get(&employee_id).copied()
    }

    /// `None` = not yet marked. Never collapsed into `Absent`.
    pub fn status_of(&self, employee_id: i64) -> Option<AttendanceStatus> {
        self.record_for(employee_id).map(|r| r.status)
    }

    pub fn marked_count(&self) -> usize {
        self.by_employee.len()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct StatusCount {
    pub status: AttendanceStatus,
    #[schema(example = 6)]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Summary {
    #[schema(example = 10)]
    pub total_employees: usize,
    /// Counts per status, in the fixed status enumeration order.
    pub by_status: Vec<StatusCount>,
    /// Present + Half Day + Work From Home.
    #[schema(example = 8)]
    pub working: usize,
    /// Paid Leave + Sick Leave + Casual Leave.
    #[schema(example = 0)]
    pub on_leave: usize,
    #[schema(example = 1)]
    pub not_marked: usize,
    /// round(working / total_employees * 100); 0 for an empty roster.
    #[schema(example = 80)]
    pub attendance_rate: u32,
}

/// Roll one day's records up into a [`Summary`]. Counting is keyed off the
/// fixed status enumeration, so the result does not depend on the order the
/// records arrive in.
pub fn summarize(records: &[AttendanceRecord], total_employees: usize) -> Summary {
    let snapshot = DailySnapshot::new(records);

    let by_status: Vec<StatusCount> = AttendanceStatus::iter()
        .map(|status| StatusCount {
            status,
            count: records.iter().filter(|r| r.status == status).count(),
        })
        .collect();

    let working = by_status
        .iter()
        .filter(|s| s.status.is_working())
        .map(|s| s.count)
        .sum();
    let on_leave = by_status
        .iter()
        .filter(|s| s.status.is_leave())
        .map(|s| s.count)
        .sum();

    let attendance_rate = if total_employees == 0 {
        0
    } else {
        ((working as f64 / total_employees as f64) * 100.0).round() as u32
    };

    Summary {
        total_employees,
        by_status,
        working,
        on_leave,
        not_marked: total_employees.saturating_sub(snapshot.marked_count()),
        attendance_rate,
    }
}
