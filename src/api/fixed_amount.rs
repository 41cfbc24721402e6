use crate::{
    api::{attendance::PAYROLL_WRITERS, non_negative},
    auth::auth::AuthUser,
    error::ServiceError,
    model::fixed_amount::{FixedAmount, SetFixedAmount},
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::info;

const FIXED_SELECT: &str = r#"
    SELECT f.id, f.user_id, u.name, f.amount
    FROM fixed_amounts f
    JOIN users u ON u.id = f.user_id
"#;

/// List fixed amounts
#[utoipa::path(
    get,
    path = "/api/fixed-amount",
    responses((status = 200, description = "Monthly fixed amounts", body = [FixedAmount])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_fixed_amounts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(PAYROLL_WRITERS)?;

    let rows = sqlx::query_as::<_, FixedAmount>(&format!("{FIXED_SELECT} ORDER BY u.name"))
        .fetch_all(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Set a user's fixed amount
///
/// Existing attendance keeps the salary computed when it was recorded.
#[utoipa::path(
    post,
    path = "/api/fixed-amount",
    request_body = SetFixedAmount,
    responses(
        (status = 200, description = "Fixed amount saved", body = FixedAmount),
        (status = 400, description = "Negative amount"),
        (status = 409, description = "Unknown user")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn set_fixed_amount(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SetFixedAmount>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(PAYROLL_WRITERS)?;
    let amount = non_negative(payload.amount, "Amount")?;

    sqlx::query(
        r#"
        INSERT INTO fixed_amounts (user_id, amount) VALUES (?, ?)
        ON DUPLICATE KEY UPDATE amount = VALUES(amount)
        "#,
    )
    .bind(payload.user_id)
    .bind(amount)
    .execute(pool.get_ref())
    .await?;

    info!(user_id = payload.user_id, amount, "Fixed amount set");

    let row = sqlx::query_as::<_, FixedAmount>(&format!("{FIXED_SELECT} WHERE f.user_id = ?"))
        .bind(payload.user_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Ok().json(row))
}
