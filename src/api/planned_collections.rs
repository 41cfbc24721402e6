use crate::{
    api::{month_filter, non_negative, required_month, required_text},
    auth::auth::AuthUser,
    error::ServiceError,
    model::{
        MonthQuery,
        collection::{PlannedCollection, PlannedCollectionInput},
    },
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

const PLANNED_SELECT: &str = r#"
    SELECT id, month, supervisor_name, product_key, num_cases, pos, basic, money_collection
    FROM planned_collections
"#;

pub async fn fetch_planned(
    pool: &MySqlPool,
    month: Option<&str>,
) -> Result<Vec<PlannedCollection>, sqlx::Error> {
    sqlx::query_as::<_, PlannedCollection>(&format!(
        "{PLANNED_SELECT} WHERE (? IS NULL OR month = ?) ORDER BY month DESC, product_key"
    ))
    .bind(month)
    .bind(month)
    .fetch_all(pool)
    .await
}

async fn find_planned(pool: &MySqlPool, id: u64) -> Result<Option<PlannedCollection>, sqlx::Error> {
    sqlx::query_as::<_, PlannedCollection>(&format!("{PLANNED_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Input with its month normalized and amounts checked.
fn validated(input: &PlannedCollectionInput) -> Result<PlannedCollectionInput, ServiceError> {
    Ok(PlannedCollectionInput {
        month: required_month(&input.month)?,
        supervisor_name: required_text(&input.supervisor_name, "Supervisor name")?.to_string(),
        product_key: required_text(&input.product_key, "Product")?.to_string(),
        num_cases: input.num_cases,
        pos: non_negative(input.pos, "POS")?,
        basic: non_negative(input.basic, "Basic")?,
        money_collection: non_negative(input.money_collection, "Money collection")?,
    })
}

/// List planned collections
#[utoipa::path(
    get,
    path = "/api/planned-collections",
    params(MonthQuery),
    responses((status = 200, description = "Planned collections", body = [PlannedCollection])),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn list_planned(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = month_filter(query.month.as_deref())?;
    let rows = fetch_planned(pool.get_ref(), filter.key()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Create planned collection
#[utoipa::path(
    post,
    path = "/api/planned-collections",
    request_body = PlannedCollectionInput,
    responses(
        (status = 201, description = "Planned collection created", body = PlannedCollection),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn create_planned(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PlannedCollectionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let input = validated(&payload)?;

    let result = sqlx::query(
        r#"
        INSERT INTO planned_collections
            (month, supervisor_name, product_key, num_cases, pos, basic, money_collection)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.month)
    .bind(&input.supervisor_name)
    .bind(&input.product_key)
    .bind(input.num_cases)
    .bind(input.pos)
    .bind(input.basic)
    .bind(input.money_collection)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(planned_id = id, month = %input.month, "Planned collection created");

    let row = find_planned(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(row))
}

/// Replace planned collection
#[utoipa::path(
    put,
    path = "/api/planned-collections/{id}",
    params(("id" = u64, Path, description = "Planned collection ID")),
    request_body = PlannedCollectionInput,
    responses(
        (status = 200, description = "Planned collection updated", body = PlannedCollection),
        (status = 404, description = "Planned collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn update_planned(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<PlannedCollectionInput>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let id = path.into_inner();
    let input = validated(&payload)?;

    sqlx::query(
        r#"
        UPDATE planned_collections
        SET month = ?, supervisor_name = ?, product_key = ?, num_cases = ?,
            pos = ?, basic = ?, money_collection = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.month)
    .bind(&input.supervisor_name)
    .bind(&input.product_key)
    .bind(input.num_cases)
    .bind(input.pos)
    .bind(input.basic)
    .bind(input.money_collection)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    find_planned(pool.get_ref(), id)
        .await?
        .map(|row| HttpResponse::Ok().json(row))
        .ok_or_else(|| ServiceError::not_found("Planned collection not found"))
}

/// Delete planned collection
#[utoipa::path(
    delete,
    path = "/api/planned-collections/{id}",
    params(("id" = u64, Path, description = "Planned collection ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Planned collection not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Collections"
)]
pub async fn delete_planned(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM planned_collections WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Planned collection not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(month: &str, money: f64) -> PlannedCollectionInput {
        PlannedCollectionInput {
            month: month.to_string(),
            supervisor_name: " Ravi ".to_string(),
            product_key: "Acme Bank - Home Loans".to_string(),
            num_cases: 40,
            pos: 0.0,
            basic: 0.0,
            money_collection: money,
        }
    }

    #[test]
    fn normalizes_month_labels_and_trims_names() {
        let v = validated(&input("March 2025", 50_000.0)).unwrap();
        assert_eq!(v.month, "2025-03");
        assert_eq!(v.supervisor_name, "Ravi");
    }

    #[test]
    fn rejects_negative_money() {
        assert!(matches!(
            validated(&input("2025-03", -1.0)),
            Err(ServiceError::BadRequest(_))
        ));
    }
}
