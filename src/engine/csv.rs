use chrono::{Datelike, NaiveDate};

use crate::engine::roster::parse_joining_date;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;

/// Literal written for a missing or unparsable date field.
pub const MISSING_DATE: &str = "N/A";

/// A record that knows its export column set.
pub trait CsvRecord {
    const COLUMNS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

/// Header row plus one row per record, fields comma-joined in column order.
/// Fields containing a delimiter, quote or line break are RFC 4180 quoted;
/// the upstream data is free text, so unquoted output would corrupt rows.
pub fn to_csv<R: CsvRecord>(records: &[R]) -> String {
    let header = R::COLUMNS.join(",");
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(header);
    for record in records {
        let row: Vec<String> = record.row().iter().map(|f| escape_field(f)).collect();
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Download name for an export: `{entity}_{yyyy-MM-dd}.csv`.
pub fn export_filename(entity: &str, date: NaiveDate) -> String {
    format!(
        "{}_{:04}-{:02}-{:02}.csv",
        entity,
        date.year(),
        date.month(),
        date.day()
    )
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl CsvRecord for Employee {
    const COLUMNS: &'static [&'static str] = &[
        "Employee ID",
        "Name",
        "Email",
        "Phone",
        "Department",
        "Position",
        "Joining Date",
    ];

    fn row(&self) -> Vec<String> {
        let joining = parse_joining_date(self.joining_date.as_deref())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| MISSING_DATE.to_string());
        vec![
            self.employee_code.clone(),
            self.full_name.clone(),
            self.email.clone(),
            self.phone.clone().unwrap_or_default(),
            self.department.clone(),
            self.position.clone(),
            joining,
        ]
    }
}

impl CsvRecord for AttendanceRecord {
    const COLUMNS: &'static [&'static str] = &["Date", "Day", "Status", "Note"];

    fn row(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.date.format("%A").to_string(),
            self.status.to_string(),
            self.note.clone().unwrap_or_default(),
        ]
    }
}
