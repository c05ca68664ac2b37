use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use utoipa::ToSchema;

use crate::model::employee::Employee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    #[serde(alias = "date")]
    JoiningDate,
    Department,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for a roster view. Doubles as the wire form of the
/// employee list endpoints, so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    pub search: Option<String>,
    /// Exact department value, or "all" (same as absent).
    pub department: Option<String>,
    pub sort_by: Option<SortKey>,
    pub order: Option<SortOrder>,
}

impl RosterQuery {
    fn search_term(&self) -> String {
        self.search.as_deref().unwrap_or("").trim().to_lowercase()
    }

    fn department_filter(&self) -> Option<&str> {
        match self.department.as_deref() {
            None | Some("all") => None,
            Some(d) => Some(d),
        }
    }

    fn sort_key(&self) -> SortKey {
        self.sort_by.unwrap_or(SortKey::Name)
    }

    fn sort_order(&self) -> SortOrder {
        self.order.unwrap_or(SortOrder::Asc)
    }

    /// Canonical cache identity of this query.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{:?}|{:?}",
            self.search_term(),
            self.department_filter().unwrap_or("all"),
            self.sort_key(),
            self.sort_order(),
        )
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct DepartmentStat {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = 7)]
    pub count: usize,
}

/// Filtered, sorted view of the roster. Pure; never fails. An empty roster
/// or a query nothing matches yields an empty vector.
pub fn roster_view(employees: &[Employee], query: &RosterQuery) -> Vec<Employee> {
    let needle = query.search_term();
    let department = query.department_filter();

    let mut view: Vec<Employee> = employees
        .iter()
        .filter(|e| matches_search(e, &needle))
        .filter(|e| department.is_none_or(|d| e.department == d))
        .cloned()
        .collect();

    // Vec::sort_by is stable, so equal keys keep their roster order. The
    // reversed comparator leaves Ordering::Equal untouched, which keeps
    // descending sorts stable too.
    let key = query.sort_key();
    let order = query.sort_order();
    view.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    view
}

/// Case-insensitive substring match against name, code, email or department.
fn matches_search(employee: &Employee, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    employee.full_name.to_lowercase().contains(needle)
        || employee.employee_code.to_lowercase().contains(needle)
        || employee.email.to_lowercase().contains(needle)
        || employee.department.to_lowercase().contains(needle)
}

fn compare(a: &Employee, b: &Employee, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => folded_cmp(&a.full_name, &b.full_name),
        SortKey::Department => folded_cmp(&a.department, &b.department),
        SortKey::JoiningDate => joining_sort_key(a).cmp(&joining_sort_key(b)),
    }
}

/// Case-folded lexicographic comparison for name/department ordering.
fn folded_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Seconds since the epoch for sorting. Missing or unparsable joining dates
/// sort as epoch zero (earliest) instead of erroring.
fn joining_sort_key(employee: &Employee) -> i64 {
    parse_joining_date(employee.joining_date.as_deref())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// Lenient date parse for directory data. Joining dates arrive as free text
/// from the form, so this accepts a plain date, an RFC 3339 timestamp, or a
/// bare ISO datetime, and gives up quietly on anything else.
pub fn parse_joining_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Distinct department values, case-folded order.
pub fn departments(employees: &[Employee]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for employee in employees {
        if !names.contains(&employee.department) {
            names.push(employee.department.clone());
        }
    }
    names.sort_by(|a, b| folded_cmp(a, b));
    names
}

/// Head count per department, in the same order as [`departments`].
pub fn department_stats(employees: &[Employee]) -> Vec<DepartmentStat> {
    departments(employees)
        .into_iter()
        .map(|name| {
            let count = employees.iter().filter(|e| e.department == name).count();
            DepartmentStat { name, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: i64, code: &str, name: &str, dept: &str, joined: Option<&str>) -> Employee {
        Employee {
            id,
            employee_code: code.to_string(),
            full_name: name.to_string(),
            email: format!("{}@corp.test", code.to_lowercase()),
            phone: None,
            department: dept.to_string(),
            position: "Analyst".to_string(),
            joining_date: joined.map(str::to_string),
        }
    }

    fn sample() -> Vec<Employee> {
        vec![
            employee(1, "EMP-001", "Charlie Root", "Engineering", Some("2021-03-15")),
            employee(2, "EMP-002", "alice Vance", "Sales", Some("2019-07-01")),
            employee(3, "EMP-003", "Bob Marsh", "Engineering", Some("not a date")),
            employee(4, "EMP-004", "Dana Cole", "Support", None),
        ]
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let roster = sample();
        let query = RosterQuery {
            search: Some("ENGINEER".to_string()),
            ..Default::default()
        };
        let view = roster_view(&roster, &query);
        assert_eq!(view.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1]);

        // Exactly the subset whose name/code/email/department contains the
        // needle, nothing else.
        let query = RosterQuery {
            search: Some("emp-002".to_string()),
            ..Default::default()
        };
        let view = roster_view(&roster, &query);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 2);
    }

    #[test]
    fn department_all_and_exact_filter() {
        let roster = sample();
        let all = RosterQuery {
            department: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(roster_view(&roster, &all).len(), 4);

        let sales = RosterQuery {
            department: Some("Sales".to_string()),
            ..Default::default()
        };
        let view = roster_view(&roster, &sales);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 2);
    }

    #[test]
    fn name_sort_is_case_folded() {
        let view = roster_view(&sample(), &RosterQuery::default());
        let names: Vec<&str> = view.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, vec!["alice Vance", "Bob Marsh", "Charlie Root", "Dana Cole"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut roster = sample();
        roster.push(employee(5, "EMP-005", "Bob Marsh", "Engineering", None));

        let query = RosterQuery {
            sort_by: Some(SortKey::Name),
            ..Default::default()
        };
        let view = roster_view(&roster, &query);
        let bobs: Vec<i64> = view
            .iter()
            .filter(|e| e.full_name == "Bob Marsh")
            .map(|e| e.id)
            .collect();
        assert_eq!(bobs, vec![3, 5]);

        // Equal keys keep roster order under a descending sort as well.
        let query = RosterQuery {
            sort_by: Some(SortKey::Department),
            order: Some(SortOrder::Desc),
            ..Default::default()
        };
        let view = roster_view(&roster, &query);
        let engineering: Vec<i64> = view
            .iter()
            .filter(|e| e.department == "Engineering")
            .map(|e| e.id)
            .collect();
        assert_eq!(engineering, vec![1, 3, 5]);
    }

    #[test]
    fn unparsable_joining_dates_sort_earliest() {
        let roster = sample();
        let query = RosterQuery {
            sort_by: Some(SortKey::JoiningDate),
            ..Default::default()
        };
        let view = roster_view(&roster, &query);
        let ids: Vec<i64> = view.iter().map(|e| e.id).collect();
        // 3 and 4 have no usable date and land at epoch zero, in roster order.
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        assert!(roster_view(&[], &RosterQuery::default()).is_empty());

        let query = RosterQuery {
            search: Some("nobody matches this".to_string()),
            ..Default::default()
        };
        assert!(roster_view(&sample(), &query).is_empty());
    }

    #[test]
    fn lenient_date_parsing() {
        assert_eq!(
            parse_joining_date(Some("2024-02-29")),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            parse_joining_date(Some("2024-02-29T08:30:00")),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            parse_joining_date(Some("2024-02-29T08:30:00+06:00")),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_joining_date(Some("soon")), None);
        assert_eq!(parse_joining_date(Some("  ")), None);
        assert_eq!(parse_joining_date(None), None);
    }

    #[test]
    fn department_stats_count_heads() {
        let stats = department_stats(&sample());
        assert_eq!(
            stats,
            vec![
                DepartmentStat { name: "Engineering".to_string(), count: 2 },
                DepartmentStat { name: "Sales".to_string(), count: 1 },
                DepartmentStat { name: "Support".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn fingerprint_normalizes_equivalent_queries() {
        let a = RosterQuery {
            search: Some("  Alice ".to_string()),
            department: None,
            ..Default::default()
        };
        let b = RosterQuery {
            search: Some("alice".to_string()),
            department: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
