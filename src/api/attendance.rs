use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

use crate::engine::attendance::{DailySnapshot, Summary, summarize};
use crate::engine::calendar::{CalendarCell, month_grid};
use crate::engine::csv;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::utils::view_cache::{Mutation, ViewCache, ViewKey};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    #[schema(example = "Half day for a doctor visit", nullable = true)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Defaults to today when absent.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

/// One roster row of the marking table: the employee and whatever status
/// the day holds for them. `status: null` means not yet marked, which is
/// not the same thing as Absent.
#[derive(Serialize, ToSchema)]
pub struct MarkingState {
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(nullable = true)]
    pub status: Option<AttendanceStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub data: Vec<AttendanceRecord>,
    /// Every employee with their marking state for the date.
    pub roster: Vec<MarkingState>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub data: Vec<AttendanceRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarResponse {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 2)]
    pub month: u32,
    pub days: Vec<CalendarCell>,
}

async fn employee_exists(pool: &SqlitePool, employee_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)")
        .bind(employee_id)
        .fetch_one(pool)
        .await
}

async fn records_for_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, employee_id, date, status, note FROM attendance WHERE date = ? ORDER BY id",
    )
    .bind(date)
    .fetch_all(pool)
    .await
}

async fn records_for_employee(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, employee_id, date, status, note
        FROM attendance
        WHERE employee_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await
}

/// Mark attendance for one employee and date (upsert)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance marked successfully"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let exists = employee_exists(pool.get_ref(), payload.employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = payload.employee_id, "Employee lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    // Last write wins: marking again for the same (employee, date) replaces
    // the record, it never accumulates a second one.
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, status, note)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (employee_id, date)
        DO UPDATE SET status = excluded.status, note = excluded.note
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.date)
    .bind(payload.status)
    .bind(&payload.note)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            cache
                .apply(Mutation::AttendanceMarked {
                    employee_id: payload.employee_id,
                    date: payload.date,
                })
                .await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Attendance marked successfully"
            })))
        }
        Err(e) => {
            error!(error = %e, employee_id = payload.employee_id, "Failed to mark attendance");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Attendance records for one date
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("date", Query, description = "Day to list, YYYY-MM-DD; defaults to today")
    ),
    responses(
        (status = 200, description = "Records for the date", body = AttendanceListResponse)
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_for_date(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let key = ViewKey::DailyRecords(date);
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let data = records_for_date(pool.get_ref(), date).await.map_err(|e| {
        error!(error = %e, %date, "Failed to fetch attendance");
        ErrorInternalServerError("Database error")
    })?;

    let employees = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, employee_code, full_name FROM employees ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    let snapshot = DailySnapshot::new(&data);
    let roster = employees
        .into_iter()
        .map(|(employee_id, employee_code, full_name)| MarkingState {
            status: snapshot.status_of(employee_id),
            employee_id,
            employee_code,
            full_name,
        })
        .collect();

    let body = serde_json::to_value(AttendanceListResponse { date, data, roster })
        .map_err(ErrorInternalServerError)?;
    cache.put(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Daily roll-up: per-status counts, working/on-leave totals, attendance rate
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(
        ("date", Query, description = "Day to summarize, YYYY-MM-DD; defaults to today")
    ),
    responses(
        (status = 200, description = "Summary for the date", body = Summary)
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn summary(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let key = ViewKey::DailySummary(date);
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let records = records_for_date(pool.get_ref(), date).await.map_err(|e| {
        error!(error = %e, %date, "Failed to fetch attendance");
        ErrorInternalServerError("Database error")
    })?;

    let total_employees = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count employees");
            ErrorInternalServerError("Database error")
        })?;

    let body = serde_json::to_value(summarize(&records, total_employees as usize))
        .map_err(ErrorInternalServerError)?;
    cache.put(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Full attendance history for one employee, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "History", body = HistoryResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn history(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let exists = employee_exists(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Employee lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let key = ViewKey::History(employee_id);
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let data = records_for_employee(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch history");
            ErrorInternalServerError("Database error")
        })?;

    let body = serde_json::to_value(HistoryResponse { data }).map_err(ErrorInternalServerError)?;
    cache.put(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Month-at-a-glance grid for one employee
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/calendar",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("year", Query, description = "Calendar year"),
        ("month", Query, description = "Calendar month, 1-12")
    ),
    responses(
        (status = 200, description = "Calendar cells spanning complete weeks", body = CalendarResponse),
        (status = 400, description = "Month out of range"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn calendar(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    path: web::Path<i64>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    if !(1..=12).contains(&query.month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }

    let exists = employee_exists(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Employee lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let key = ViewKey::Calendar {
        employee_id,
        year: query.year,
        month: query.month,
    };
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let records = records_for_employee(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch history");
            ErrorInternalServerError("Database error")
        })?;

    let body = serde_json::to_value(CalendarResponse {
        year: query.year,
        month: query.month,
        days: month_grid(query.year, query.month, &records),
    })
    .map_err(ErrorInternalServerError)?;
    cache.put(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Export one employee's attendance history as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/export",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "CSV payload", content_type = "text/csv"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_history(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let exists = employee_exists(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Employee lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let records = records_for_employee(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch history for export");
            ErrorInternalServerError("Database error")
        })?;

    let out = csv::to_csv(&records);
    let filename = csv::export_filename("attendance", Local::now().date_naive());

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(out))
}
