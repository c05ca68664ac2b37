use crate::api::attendance::{
    AttendanceListResponse, CalendarResponse, HistoryResponse, MarkAttendance, MarkingState,
};
use crate::api::employee::{
    CreateEmployee, DepartmentListResponse, EmployeeListResponse,
};
use crate::auth::provider::{Credentials, Session};
use crate::engine::attendance::{StatusCount, Summary};
use crate::engine::calendar::CalendarCell;
use crate::engine::roster::DepartmentStat;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Roster Service API",
        version = "1.0.0",
        description = r#"
## HR Roster Service

REST API for a small human-resources roster: an employee directory, daily
attendance marking, and attendance reporting.

### Key Features
- **Employee Directory**
  - Create, update, list, search/sort and delete employee profiles
  - Department breakdown with head counts
  - CSV export of any filtered roster view
- **Attendance**
  - One record per employee per day; re-marking replaces the old status
  - Daily summaries (working / on leave / not marked, attendance rate)
  - Month-at-a-glance calendar grids and per-employee history exports

### Security
Endpoints under the API prefix require a **JWT bearer token** from
`POST /auth/login`. The bundled credential source is a single configured
account; the provider is pluggable.

### Response Format
- JSON everywhere, except CSV downloads on the export endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::session,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::departments,
        crate::api::employee::export_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark,
        crate::api::attendance::list_for_date,
        crate::api::attendance::summary,
        crate::api::attendance::history,
        crate::api::attendance::calendar,
        crate::api::attendance::export_history
    ),
    components(
        schemas(
            Credentials,
            Session,
            Employee,
            CreateEmployee,
            EmployeeListResponse,
            DepartmentListResponse,
            DepartmentStat,
            AttendanceStatus,
            AttendanceRecord,
            MarkAttendance,
            MarkingState,
            AttendanceListResponse,
            HistoryResponse,
            CalendarResponse,
            CalendarCell,
            Summary,
            StatusCount
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Session APIs"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
