use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::engine::csv;
use crate::engine::roster::{self, DepartmentStat, RosterQuery};
use crate::model::employee::Employee;
use crate::utils::code_filter;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::view_cache::{Mutation, ViewCache, ViewKey};

/// Columns a directory edit may touch.
const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "full_name",
    "email",
    "phone",
    "department",
    "position",
    "joining_date",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001", value_type = String)]
    pub employee_code: String,
    #[schema(example = "John Doe", value_type = String)]
    pub full_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[serde(default)]
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Engineering", value_type = String)]
    pub department: String,
    #[schema(example = "Backend Developer", value_type = String)]
    pub position: String,
    #[serde(default)]
    #[schema(example = "2026-01-01", format = "date", nullable = true)]
    pub joining_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentListResponse {
    pub data: Vec<DepartmentStat>,
}

async fn fetch_roster(pool: &SqlitePool) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, full_name, email, phone, department, position, joining_date
        FROM employees
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// true  => employee code AVAILABLE
/// false => employee code TAKEN
async fn is_code_available(code: &str, pool: &SqlitePool) -> bool {
    // Cuckoo filter fast negative: if the filter has never seen the code,
    // it is definitely free and the database is not consulted.
    if !code_filter::might_exist(code) {
        return true;
    }

    // Possible false positive; the database decides.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ? LIMIT 1)",
    )
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        // SQLite UNIQUE / PRIMARY KEY constraint codes.
        return matches!(db_err.code().as_deref(), Some("2067") | Some("1555"));
    }
    false
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": 1
        })),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Duplicate employee code", body = Object, example = json!({
            "message": "Employee code already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    payload: web::Json<CreateEmployee>,
) -> impl Responder {
    let code = payload.employee_code.trim();

    if code.is_empty() || payload.full_name.trim().is_empty() || payload.email.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "message": "employee_code, full_name and email must not be empty"
        }));
    }

    if !is_code_available(code, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "message": "Employee code already exists"
        }));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, full_name, email, phone, department, position, joining_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(code)
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.position)
    .bind(&payload.joining_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            code_filter::insert(code);
            cache.apply(Mutation::EmployeeCreated).await;

            HttpResponse::Created().json(json!({
                "message": "Employee created successfully",
                "id": res.last_insert_rowid()
            }))
        }
        Err(e) if is_unique_violation(&e) => HttpResponse::Conflict().json(json!({
            "message": "Employee code already exists"
        })),
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}

/// List employees as a filtered, sorted roster view
#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("search", Query, description = "Case-insensitive match on name, code, email or department"),
        ("department", Query, description = "Exact department, or \"all\""),
        ("sort_by", Query, description = "name | joining_date | department"),
        ("order", Query, description = "asc | desc")
    ),
    responses(
        (status = 200, description = "Roster view", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let key = ViewKey::Roster(query.fingerprint());
    if let Some(cached) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    debug!(query = ?*query, "Computing roster view");

    let employees = fetch_roster(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    let data = roster::roster_view(&employees, &query);
    let body = serde_json::to_value(EmployeeListResponse { total: data.len(), data })
        .map_err(ErrorInternalServerError)?;

    cache.put(key, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Department values with head counts
#[utoipa::path(
    get,
    path = "/api/employees/departments",
    responses(
        (status = 200, description = "Departments", body = DepartmentListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn departments(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
) -> actix_web::Result<impl Responder> {
    if let Some(cached) = cache.get(&ViewKey::Departments).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let employees = fetch_roster(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    let body = serde_json::to_value(DepartmentListResponse {
        data: roster::department_stats(&employees),
    })
    .map_err(ErrorInternalServerError)?;

    cache.put(ViewKey::Departments, body.clone()).await;

    Ok(HttpResponse::Ok().json(body))
}

/// Export the (filtered) roster as CSV
#[utoipa::path(
    get,
    path = "/api/employees/export",
    params(
        ("search", Query, description = "Same filters as the list endpoint"),
        ("department", Query, description = "Exact department, or \"all\""),
        ("sort_by", Query, description = "name | joining_date | department"),
        ("order", Query, description = "asc | desc")
    ),
    responses(
        (status = 200, description = "CSV payload", content_type = "text/csv")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_employees(
    pool: web::Data<SqlitePool>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let employees = fetch_roster(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees for export");
        ErrorInternalServerError("Database error")
    })?;

    let view = roster::roster_view(&employees, &query);
    let out = csv::to_csv(&view);
    let filename = csv::export_filename("employees", Local::now().date_naive());

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(out))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, full_name, email, phone, department, position, joining_date
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Empty or unknown fields"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Duplicate employee code"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let new_code = body
        .get("employee_code")
        .and_then(Value::as_str)
        .map(str::to_string);

    // Needed to keep the code filter honest when the code changes.
    let old_code = if new_code.is_some() {
        sqlx::query_scalar::<_, String>("SELECT employee_code FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?
    } else {
        None
    };

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = match execute_update(pool.get_ref(), update).await {
        Ok(n) => n,
        Err(e) if is_unique_violation(&e) => {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "Employee code already exists"
            })));
        }
        Err(e) => {
            error!(error = %e, employee_id, "Failed to update employee");
            return Err(actix_web::error::ErrorInternalServerError(e));
        }
    };

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    if let (Some(old), Some(new)) = (old_code, new_code) {
        if old != new {
            code_filter::remove(&old);
            code_filter::insert(&new);
        }
    }

    cache.apply(Mutation::EmployeeUpdated { id: employee_id }).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee (and its attendance records)
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    pool: web::Data<SqlitePool>,
    cache: web::Data<ViewCache>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let code = sqlx::query_scalar::<_, String>("SELECT employee_code FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee for delete");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(code) = code else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    // Attendance rows go with the employee, atomically.
    let result: Result<(), sqlx::Error> = async {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }
    .await;

    match result {
        Ok(()) => {
            code_filter::remove(&code);
            cache.apply(Mutation::EmployeeDeleted { id: employee_id }).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use actix_web::{App, test, web::Data};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    macro_rules! test_app {
        ($pool:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new($pool.clone()))
                    .app_data(Data::new(ViewCache::new()))
                    .service(
                        web::resource("/api/employees")
                            .route(web::get().to(list_employees))
                            .route(web::post().to(create_employee)),
                    )
                    .service(
                        web::resource("/api/employees/departments")
                            .route(web::get().to(departments)),
                    )
                    .service(
                        web::resource("/api/employees/export")
                            .route(web::get().to(export_employees)),
                    )
                    .service(
                        web::resource("/api/employees/{id}")
                            .route(web::get().to(get_employee))
                            .route(web::put().to(update_employee))
                            .route(web::delete().to(delete_employee)),
                    ),
            )
            .await
        };
    }

    fn employee_payload(code: &str, name: &str, dept: &str) -> serde_json::Value {
        json!({
            "employee_code": code,
            "full_name": name,
            "email": format!("{}@corp.test", code.to_lowercase()),
            "department": dept,
            "position": "Analyst",
            "joining_date": "2023-05-01"
        })
    }

    #[actix_web::test]
    async fn create_then_list_round_trip() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T1-001", "John Doe", "Engineering"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::get().uri("/api/employees").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["full_name"], "John Doe");
    }

    #[actix_web::test]
    async fn duplicate_code_is_a_conflict() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T2-001", "John Doe", "Engineering"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T2-001", "Jane Doe", "Sales"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Employee code already exists");
    }

    #[actix_web::test]
    async fn list_applies_search_and_sort_params() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        for payload in [
            employee_payload("T3-001", "Charlie Root", "Engineering"),
            employee_payload("T3-002", "Alice Vance", "Sales"),
            employee_payload("T3-003", "Bob Marsh", "Engineering"),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/employees")
                .set_json(payload)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 201);
        }

        let req = test::TestRequest::get()
            .uri("/api/employees?search=engineering&sort_by=name&order=desc")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["full_name"], "Charlie Root");
        assert_eq!(body["data"][1]["full_name"], "Bob Marsh");
    }

    #[actix_web::test]
    async fn update_changes_fields_and_misses_unknown_ids() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T4-001", "John Doe", "Engineering"))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/employees/{id}"))
            .set_json(json!({"department": "Sales", "position": "Manager"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["department"], "Sales");
        assert_eq!(body["position"], "Manager");

        let req = test::TestRequest::put()
            .uri("/api/employees/999999")
            .set_json(json!({"department": "Sales"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn delete_cascades_to_attendance() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T5-001", "John Doe", "Engineering"))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_i64().unwrap();

        sqlx::query("INSERT INTO attendance (employee_id, date, status) VALUES (?, ?, ?)")
            .bind(id)
            .bind("2024-02-01")
            .bind("Present")
            .execute(&pool)
            .await
            .unwrap();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE employee_id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[actix_web::test]
    async fn export_is_csv_with_headers() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(employee_payload("T6-001", "John Doe", "Engineering"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::get()
            .uri("/api/employees/export")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap().to_str().unwrap(),
            "text/csv"
        );
        let disposition = resp
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"employees_"));

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("Employee ID,Name,Email,Phone,Department,Position,Joining Date"));
        assert!(text.lines().nth(1).unwrap().contains("John Doe"));
    }
}
