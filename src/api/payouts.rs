use crate::{
    api::{month_filter, required_month, required_text, verifications::find_verification},
    auth::auth::AuthUser,
    domain::payout::case_salary,
    error::ServiceError,
    model::{
        MonthQuery,
        payout::{CaseEntry, CreateCaseEntry, UpdateCaseEntry},
        verification::Verification,
    },
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

const CASE_SELECT: &str = r#"
    SELECT ce.id, ce.name, ce.verification_id, p.name AS process_name,
           v.location, v.price, ce.number_of_cases, ce.month, ce.salary
    FROM case_entries ce
    JOIN verifications v ON v.id = ce.verification_id
    JOIN processes p ON p.id = v.process_id
"#;

const VERIFICATION_NOT_FOUND: &str = "Verification entry not found";

pub async fn fetch_case_entries(
    pool: &MySqlPool,
    month: Option<&str>,
) -> Result<Vec<CaseEntry>, sqlx::Error> {
    sqlx::query_as::<_, CaseEntry>(&format!(
        "{CASE_SELECT} WHERE (? IS NULL OR ce.month = ?) ORDER BY ce.month DESC, ce.name"
    ))
    .bind(month)
    .bind(month)
    .fetch_all(pool)
    .await
}

async fn find_case_entry(pool: &MySqlPool, id: u64) -> Result<Option<CaseEntry>, sqlx::Error> {
    sqlx::query_as::<_, CaseEntry>(&format!("{CASE_SELECT} WHERE ce.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn price_of(verification: Option<Verification>) -> Result<f64, ServiceError> {
    verification
        .map(|v| v.price)
        .ok_or_else(|| ServiceError::not_found(VERIFICATION_NOT_FOUND))
}

/// Price of a verification, or the 404 every payout write reports.
async fn verification_price(pool: &MySqlPool, verification_id: u64) -> Result<f64, ServiceError> {
    price_of(find_verification(pool, verification_id).await?)
}

/// List case entries
#[utoipa::path(
    get,
    path = "/api/payout-verifications",
    params(MonthQuery),
    responses(
        (status = 200, description = "Case entries with their salary", body = [CaseEntry]),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn list_case_entries(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;
    let rows = fetch_case_entries(pool.get_ref(), filter.key()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Record case entry
#[utoipa::path(
    post,
    path = "/api/payout-verifications",
    request_body = CreateCaseEntry,
    responses(
        (status = 201, description = "Case entry saved with salary = cases x price", body = CaseEntry),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Verification entry not found", body = Object, example = json!({
            "message": "Verification entry not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn create_case_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCaseEntry>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let name = required_text(&payload.name, "Name")?;
    let month = required_month(&payload.month)?;

    let price = verification_price(pool.get_ref(), payload.verification_id).await?;
    let salary = case_salary(payload.number_of_cases, price);

    let result = sqlx::query(
        r#"
        INSERT INTO case_entries (name, verification_id, number_of_cases, month, salary)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(payload.verification_id)
    .bind(payload.number_of_cases)
    .bind(&month)
    .bind(salary)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(case_entry_id = id, month = %month, salary, "Case entry recorded");

    let entry = find_case_entry(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(entry))
}

/// Update case entry, recomputing its salary
#[utoipa::path(
    put,
    path = "/api/payout-verifications/{id}",
    params(("id" = u64, Path, description = "Case entry ID")),
    request_body = UpdateCaseEntry,
    responses(
        (status = 200, description = "Case entry updated", body = CaseEntry),
        (status = 404, description = "Case entry or verification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn update_case_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateCaseEntry>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let id = path.into_inner();

    let current = find_case_entry(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Case entry not found"))?;

    let name = match &payload.name {
        Some(name) => required_text(name, "Name")?.to_string(),
        None => current.name,
    };
    let month = match &payload.month {
        Some(month) => required_month(month)?,
        None => current.month,
    };
    let verification_id = payload.verification_id.unwrap_or(current.verification_id);
    let number_of_cases = payload.number_of_cases.unwrap_or(current.number_of_cases);

    let price = verification_price(pool.get_ref(), verification_id).await?;
    let salary = case_salary(number_of_cases, price);

    sqlx::query(
        r#"
        UPDATE case_entries
        SET name = ?, verification_id = ?, number_of_cases = ?, month = ?, salary = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(verification_id)
    .bind(number_of_cases)
    .bind(&month)
    .bind(salary)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    let entry = find_case_entry(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Case entry not found"))?;
    Ok(HttpResponse::Ok().json(entry))
}

/// Delete case entry
#[utoipa::path(
    delete,
    path = "/api/payout-verifications/{id}",
    params(("id" = u64, Path, description = "Case entry ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Case entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn delete_case_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM case_entries WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Case entry not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, body::to_bytes, http::StatusCode};

    #[actix_web::test]
    async fn unknown_verification_is_a_404_with_message() {
        let resp = price_of(None).unwrap_err().error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "message": "Verification entry not found" }));
    }

    #[test]
    fn known_verification_yields_its_price() {
        let verification = Verification {
            id: 4,
            process_id: 2,
            process_name: "Field verification".to_string(),
            location: "Pune".to_string(),
            price: 120.0,
        };
        assert_eq!(price_of(Some(verification)).unwrap(), 120.0);
    }
}
