use crate::{
    api::{month_filter, non_negative, required_month, required_text},
    auth::auth::AuthUser,
    error::ServiceError,
    model::{
        MonthQuery,
        collection::{ReceivedCollection, ReceivedCollectionInput},
        role::Role,
    },
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

/// Accounts books what came in, alongside managers.
const WRITERS: &[Role] = &[Role::Admin, Role::Manager, Role::Accounts];

const RECEIVED_SELECT: &str = r#"
    SELECT id, month, process_key, bill_amount, tds, balance, rate,
           gross_salary, net_salary, total
    FROM received_collections
"#;

pub async fn fetch_received(
    pool: &MySqlPool,
    month: Option<&str>,
) -> Result<Vec<ReceivedCollection>, sqlx::Error> {
    sqlx::query_as::<_, ReceivedCollection>(&format!(
        "{RECEIVED_SELECT} WHERE (? IS NULL OR month = ?) ORDER BY month DESC, process_key"
    ))
    .bind(month)
    .bind(month)
    .fetch_all(pool)
    .await
}

async fn find_received(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<ReceivedCollection>, sqlx::Error> {
    sqlx::query_as::<_, ReceivedCollection>(&format!("{RECEIVED_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn validated(input: &ReceivedCollectionInput) -> Result<ReceivedCollectionInput, ServiceError> {
    if !input.tds.is_finite() || !input.balance.is_finite() {
        return Err(ServiceError::bad_request("Amounts must be numbers"));
    }

    Ok(ReceivedCollectionInput {
        month: required_month(&input.month)?,
        process_key: required_text(&input.process_key, "Process")?.to_string(),
        bill_amount: non_negative(input.bill_amount, "Bill amount")?,
        tds: input.tds,
        balance: input.balance,
        rate: non_negative(input.rate, "Rate")?,
        gross_salary: non_negative(input.gross_salary, "Gross salary")?,
        net_salary: non_negative(input.net_salary, "Net salary")?,
        total: non_negative(input.total, "Total")?,
    })
}

/// List received collections
#[utoipa::path(
    get,
    path = "/api/planned-collections/recived",
    params(MonthQuery),
    responses((status = 200, description = "Received collections", body = [ReceivedCollection])),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn list_received(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;
    let rows = fetch_received(pool.get_ref(), filter.key()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Record received collection
#[utoipa::path(
    post,
    path = "/api/planned-collections/recived",
    request_body = ReceivedCollectionInput,
    responses(
        (status = 201, description = "Received collection created", body = ReceivedCollection),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn create_received(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ReceivedCollectionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(WRITERS)?;
    let input = validated(&payload)?;

    let result = sqlx::query(
        r#"
        INSERT INTO received_collections
            (month, process_key, bill_amount, tds, balance, rate, gross_salary, net_salary, total)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.month)
    .bind(&input.process_key)
    .bind(input.bill_amount)
    .bind(input.tds)
    .bind(input.balance)
    .bind(input.rate)
    .bind(input.gross_salary)
    .bind(input.net_salary)
    .bind(input.total)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(received_id = id, month = %input.month, total = input.total, "Received collection recorded");

    let row = find_received(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(row))
}

/// Replace received collection
#[utoipa::path(
    put,
    path = "/api/planned-collections/recived/{id}",
    params(("id" = u64, Path, description = "Received collection ID")),
    request_body = ReceivedCollectionInput,
    responses(
        (status = 200, description = "Received collection updated", body = ReceivedCollection),
        (status = 404, description = "Received collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update_received(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReceivedCollectionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_any(WRITERS)?;
    let id = path.into_inner();
    let input = validated(&payload)?;

    sqlx::query(
        r#"
        UPDATE received_collections
        SET month = ?, process_key = ?, bill_amount = ?, tds = ?, balance = ?,
            rate = ?, gross_salary = ?, net_salary = ?, total = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.month)
    .bind(&input.process_key)
    .bind(input.bill_amount)
    .bind(input.tds)
    .bind(input.balance)
    .bind(input.rate)
    .bind(input.gross_salary)
    .bind(input.net_salary)
    .bind(input.total)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    find_received(pool.get_ref(), id)
        .await?
        .map(|row| HttpResponse::Ok().json(row))
        .ok_or_else(|| ServiceError::not_found("Received collection not found"))
}

/// Delete received collection
#[utoipa::path(
    delete,
    path = "/api/planned-collections/recived/{id}",
    params(("id" = u64, Path, description = "Received collection ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Received collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn delete_received(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM received_collections WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Received collection not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
