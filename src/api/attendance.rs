use std::collections::HashMap;

use crate::{
    api::{month_filter, required_month},
    auth::auth::AuthUser,
    domain::{
        attendance::{
            DayCounts, SheetError, UserDirectory, fixed_salary, match_rows, parse_sheet,
            summarize_errors, validate_days, write_sheet,
        },
        month::{ALL_MONTHS, month_label},
    },
    error::ServiceError,
    model::{
        MonthQuery,
        attendance::{AttendanceRecord, CreateAttendance, ImportSummary, UpdateAttendance},
        role::Role,
    },
};
use actix_web::{HttpResponse, http::header, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, warn};

/// Roles that may record attendance and fixed amounts.
pub(crate) const PAYROLL_WRITERS: &[Role] = &[Role::Admin, Role::Manager, Role::Accounts];

const ATTENDANCE_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.month, u.name, u.identifier,
           a.working_days, a.leave_days, a.unpaid_leave, a.salary
    FROM attendance a
    JOIN users u ON u.id = a.user_id
"#;

pub async fn fetch_attendance(
    pool: &MySqlPool,
    month: Option<&str>,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{ATTENDANCE_SELECT} WHERE (? IS NULL OR a.month = ?) ORDER BY a.month DESC, u.name"
    ))
    .bind(month)
    .bind(month)
    .fetch_all(pool)
    .await
}

async fn find_attendance(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!("{ATTENDANCE_SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Configured monthly amount, 0 when none is set.
async fn fixed_amount_of(pool: &MySqlPool, user_id: u64) -> Result<f64, sqlx::Error> {
    let amount: Option<f64> = sqlx::query_scalar("SELECT amount FROM fixed_amounts WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(amount.unwrap_or(0.0))
}

fn checked_days(working_days: i32, leave: i32, unpaid_leave: i32) -> Result<DayCounts, ServiceError> {
    validate_days(working_days, leave, unpaid_leave)
        .map_err(|e| ServiceError::bad_request(e.to_string()))
}

/// List attendance
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(MonthQuery),
    responses((status = 200, description = "Attendance records", body = [AttendanceRecord])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;
    let rows = fetch_attendance(pool.get_ref(), filter.key()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Get attendance record
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceRecord),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    find_attendance(pool.get_ref(), path.into_inner())
        .await?
        .map(|r| HttpResponse::Ok().json(r))
        .ok_or_else(|| ServiceError::not_found("Attendance record not found"))
}

/// Record attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Days do not add up to 30", body = Object, example = json!({
            "message": "Working days, leave and unpaid leave must add up to 30 (total: 29)"
        })),
        (status = 409, description = "Attendance already recorded for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn create_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendance>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(PAYROLL_WRITERS)?;

    let month = required_month(&payload.month)?;
    let days = checked_days(payload.working_days, payload.leave, payload.unpaid_leave)?;
    let salary = fixed_salary(fixed_amount_of(pool.get_ref(), payload.user_id).await?, &days);

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (user_id, month, working_days, leave_days, unpaid_leave, salary)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(&month)
    .bind(days.working_days)
    .bind(days.leave)
    .bind(days.unpaid_leave)
    .bind(salary)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(attendance_id = id, user_id = payload.user_id, month = %month, "Attendance recorded");

    let record = find_attendance(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(record))
}

/// Update attendance, recomputing the salary
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance ID")),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 400, description = "Days do not add up to 30"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(PAYROLL_WRITERS)?;

    let id = path.into_inner();
    let days = checked_days(payload.working_days, payload.leave, payload.unpaid_leave)?;
    let current = find_attendance(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attendance record not found"))?;

    let salary = fixed_salary(fixed_amount_of(pool.get_ref(), current.user_id).await?, &days);

    sqlx::query(
        r#"
        UPDATE attendance
        SET working_days = ?, leave_days = ?, unpaid_leave = ?, salary = ?
        WHERE id = ?
        "#,
    )
    .bind(days.working_days)
    .bind(days.leave)
    .bind(days.unpaid_leave)
    .bind(salary)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    let record = find_attendance(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attendance record not found"))?;
    Ok(HttpResponse::Ok().json(record))
}

/// Name, username and identifier of every active user.
async fn user_directory(pool: &MySqlPool) -> Result<UserDirectory, sqlx::Error> {
    let users: Vec<(u64, String, String, Option<String>)> = sqlx::query_as(
        "SELECT id, name, username, identifier FROM users WHERE is_active = TRUE ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut directory = UserDirectory::default();
    for (id, name, username, identifier) in &users {
        directory.insert(
            *id,
            [Some(name.as_str()), Some(username.as_str()), identifier.as_deref()]
                .into_iter()
                .flatten(),
        );
    }
    Ok(directory)
}

/// Import an attendance sheet
///
/// The body is a CSV export of the sheet with the columns
/// `Name, Working Days, Leave, Unpaid Leave`. Nothing is written unless
/// every row is valid and names an active employee.
#[utoipa::path(
    post,
    path = "/api/attendance/import",
    params(MonthQuery),
    request_body(content = String, content_type = "text/csv", description = "Attendance sheet"),
    responses(
        (status = 200, description = "Sheet imported", body = ImportSummary),
        (status = 400, description = "Unreadable sheet or missing month"),
        (status = 422, description = "Rows failed validation; nothing imported", body = Object, example = json!({
            "message": "Row 3: 'Nobody' does not match any employee; Row 4 (Vikram): Working days, leave and unpaid leave must add up to 30 (total: 29)",
            "validationErrors": [{ "row": 4, "name": "Vikram", "message": "Working days, leave and unpaid leave must add up to 30 (total: 29)" }],
            "mismatches": [{ "row": 3, "name": "Nobody" }]
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn import_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(PAYROLL_WRITERS)?;

    let month = query
        .month
        .as_deref()
        .ok_or_else(|| ServiceError::bad_request("Month is required"))
        .and_then(required_month)?;

    let rows = parse_sheet(&body).map_err(|e| match e {
        SheetError::Csv(ref inner) => {
            warn!(error = %inner, "Unreadable attendance sheet");
            ServiceError::bad_request(e.to_string())
        }
        other => ServiceError::bad_request(other.to_string()),
    })?;

    let directory = user_directory(pool.get_ref()).await?;
    let matched = match match_rows(rows, |name| directory.lookup(name)) {
        Ok(matched) => matched,
        Err(problems) => {
            info!(
                month = %month,
                errors = problems.validation_errors.len(),
                mismatches = problems.mismatches.len(),
                "Attendance import rejected"
            );
            let details = serde_json::to_value(&problems).map_err(|e| {
                error!(error = %e, "Failed to serialize import report");
                ServiceError::Internal
            })?;
            return Err(ServiceError::Unprocessable {
                message: summarize_errors(&problems.messages()),
                details,
            });
        }
    };

    let amounts: HashMap<u64, f64> = sqlx::query_as::<_, (u64, f64)>("SELECT user_id, amount FROM fixed_amounts")
        .fetch_all(pool.get_ref())
        .await?
        .into_iter()
        .collect();

    let mut tx = pool.begin().await?;
    for row in &matched {
        let amount = amounts.get(&row.user_id).copied().unwrap_or(0.0);

        sqlx::query(
            r#"
            INSERT INTO attendance (user_id, month, working_days, leave_days, unpaid_leave, salary)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                working_days = VALUES(working_days),
                leave_days = VALUES(leave_days),
                unpaid_leave = VALUES(unpaid_leave),
                salary = VALUES(salary)
            "#,
        )
        .bind(row.user_id)
        .bind(&month)
        .bind(row.days.working_days)
        .bind(row.days.leave)
        .bind(row.days.unpaid_leave)
        .bind(fixed_salary(amount, &row.days))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    let label = month_label(&month).unwrap_or_else(|| month.clone());
    info!(month = %month, imported = matched.len(), by = auth.user_id, "Attendance imported");

    Ok(HttpResponse::Ok().json(ImportSummary {
        message: format!("Imported {} attendance rows for {label}", matched.len()),
        month,
        imported: matched.len(),
    }))
}

/// Export attendance as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(MonthQuery),
    responses(
        (status = 200, description = "CSV in the import layout plus identifier and salary", content_type = "text/csv", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;
    let records = fetch_attendance(pool.get_ref(), filter.key()).await?;

    let csv = write_sheet(&records).map_err(|e| {
        error!(error = %e, "Failed to write attendance sheet");
        ServiceError::Internal
    })?;

    let filename = format!("attendance-{}.csv", filter.key().unwrap_or(ALL_MONTHS));

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(csv))
}
