use crate::{
    api::{non_negative, required_text},
    auth::auth::AuthUser,
    error::ServiceError,
    model::verification::{CreateVerification, Verification, VerificationQuery},
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

const VERIFICATION_SELECT: &str = r#"
    SELECT v.id, v.process_id, p.name AS process_name, v.location, v.price
    FROM verifications v
    JOIN processes p ON p.id = v.process_id
"#;

pub async fn find_verification(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<Verification>, sqlx::Error> {
    sqlx::query_as::<_, Verification>(&format!("{VERIFICATION_SELECT} WHERE v.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List verifications
#[utoipa::path(
    get,
    path = "/api/verifications",
    params(VerificationQuery),
    responses((status = 200, description = "Priced verifications", body = [Verification])),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn list_verifications(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<VerificationQuery>,
) -> Result<HttpResponse, ServiceError> {
    let rows = sqlx::query_as::<_, Verification>(&format!(
        "{VERIFICATION_SELECT} WHERE (? IS NULL OR v.process_id = ?) ORDER BY p.name, v.location"
    ))
    .bind(query.process_id)
    .bind(query.process_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Create verification
#[utoipa::path(
    post,
    path = "/api/verifications",
    request_body = CreateVerification,
    responses(
        (status = 201, description = "Verification created", body = Verification),
        (status = 400, description = "Negative price or blank location"),
        (status = 409, description = "Unknown process")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn create_verification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateVerification>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let location = required_text(&payload.location, "Location")?;
    let price = non_negative(payload.price, "Price")?;

    let result =
        sqlx::query("INSERT INTO verifications (process_id, location, price) VALUES (?, ?, ?)")
            .bind(payload.process_id)
            .bind(location)
            .bind(price)
            .execute(pool.get_ref())
            .await?;

    let id = result.last_insert_id();
    info!(verification_id = id, process_id = payload.process_id, price, "Verification created");

    let verification = find_verification(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(verification))
}

/// Update verification
///
/// Existing case entries keep the salary computed when they were saved.
#[utoipa::path(
    put,
    path = "/api/verifications/{id}",
    params(("id" = u64, Path, description = "Verification ID")),
    request_body = CreateVerification,
    responses(
        (status = 200, description = "Verification updated", body = Verification),
        (status = 404, description = "Verification entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn update_verification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateVerification>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let id = path.into_inner();
    let location = required_text(&payload.location, "Location")?;
    let price = non_negative(payload.price, "Price")?;

    if find_verification(pool.get_ref(), id).await?.is_none() {
        return Err(ServiceError::not_found("Verification entry not found"));
    }

    sqlx::query("UPDATE verifications SET process_id = ?, location = ?, price = ? WHERE id = ?")
        .bind(payload.process_id)
        .bind(location)
        .bind(price)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    let verification = find_verification(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Verification entry not found"))?;
    Ok(HttpResponse::Ok().json(verification))
}

/// Delete verification
#[utoipa::path(
    delete,
    path = "/api/verifications/{id}",
    params(("id" = u64, Path, description = "Verification ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Verification entry not found"),
        (status = 409, description = "Verification still has case entries")
    ),
    security(("bearer_auth" = [])),
    tag = "Payouts"
)]
pub async fn delete_verification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM verifications WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Verification entry not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
