use crate::{
    api::required_text,
    auth::auth::AuthUser,
    error::ServiceError,
    model::process::{CreateProcess, Process, ProcessQuery},
    utils::db_utils::{Column, as_object, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;

const PROCESS_SELECT: &str = r#"
    SELECT p.id, p.name, p.customer_id, c.name AS customer_name,
           p.product_id, pr.name AS product_name, p.description
    FROM processes p
    JOIN customers c ON c.id = p.customer_id
    LEFT JOIN products pr ON pr.id = p.product_id
"#;

const UPDATABLE: &[Column] = &[
    ("name", "name"),
    ("clientId", "customer_id"),
    ("productId", "product_id"),
    ("description", "description"),
];

/// Every process with its collection label, optionally for one client.
pub async fn fetch_processes(
    pool: &MySqlPool,
    customer_id: Option<u64>,
) -> Result<Vec<Process>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Process>(&format!(
        "{PROCESS_SELECT} WHERE (? IS NULL OR p.customer_id = ?) ORDER BY c.name, p.name"
    ))
    .bind(customer_id)
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Process::with_label).collect())
}

async fn find_process(pool: &MySqlPool, id: u64) -> Result<Option<Process>, sqlx::Error> {
    let row = sqlx::query_as::<_, Process>(&format!("{PROCESS_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Process::with_label))
}

/// The product, when given, must belong to the same client.
async fn check_product(
    pool: &MySqlPool,
    customer_id: u64,
    product_id: Option<u64>,
) -> Result<(), ServiceError> {
    let Some(product_id) = product_id else {
        return Ok(());
    };

    let owner: Option<u64> = sqlx::query_scalar("SELECT customer_id FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        Some(owner) if owner == customer_id => Ok(()),
        Some(_) => Err(ServiceError::bad_request("Product belongs to a different client")),
        None => Err(ServiceError::not_found("Product not found")),
    }
}

/// List processes
#[utoipa::path(
    get,
    path = "/api/process",
    params(ProcessQuery),
    responses((status = 200, description = "Processes with their labels", body = [Process])),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn list_processes(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ProcessQuery>,
) -> Result<HttpResponse, ServiceError> {
    let processes = fetch_processes(pool.get_ref(), query.client_id).await?;
    Ok(HttpResponse::Ok().json(processes))
}

/// Create process
#[utoipa::path(
    post,
    path = "/api/process",
    request_body = CreateProcess,
    responses(
        (status = 201, description = "Process created", body = Process),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn create_process(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProcess>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let name = required_text(&payload.name, "Name")?;
    check_product(pool.get_ref(), payload.customer_id, payload.product_id).await?;

    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let result = sqlx::query(
        "INSERT INTO processes (customer_id, product_id, name, description) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.customer_id)
    .bind(payload.product_id)
    .bind(name)
    .bind(description)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(process_id = id, customer_id = payload.customer_id, "Process created");

    let process = find_process(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(process))
}

/// Get process
#[utoipa::path(
    get,
    path = "/api/process/{id}",
    params(("id" = u64, Path, description = "Process ID")),
    responses(
        (status = 200, description = "Process", body = Process),
        (status = 404, description = "Process not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn get_process(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    find_process(pool.get_ref(), path.into_inner())
        .await?
        .map(|p| HttpResponse::Ok().json(p))
        .ok_or_else(|| ServiceError::not_found("Process not found"))
}

/// Update process
#[utoipa::path(
    put,
    path = "/api/process/{id}",
    params(("id" = u64, Path, description = "Process ID")),
    request_body(content = Object, description = "Any of name, clientId, productId, description"),
    responses(
        (status = 200, description = "Process updated", body = Process),
        (status = 404, description = "Process not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn update_process(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let id = path.into_inner();
    let payload = as_object(&body)?;
    let current = find_process(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Process not found"))?;

    if payload.contains_key("clientId") || payload.contains_key("productId") {
        let customer_id = payload
            .get("clientId")
            .and_then(Value::as_u64)
            .unwrap_or(current.customer_id);
        let product_id = match payload.get("productId") {
            Some(value) => value.as_u64(),
            None => current.product_id,
        };
        check_product(pool.get_ref(), customer_id, product_id).await?;
    }

    let update = build_update_sql("processes", payload, UPDATABLE, id)?;
    execute_update(pool.get_ref(), update).await?;

    let process = find_process(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Process not found"))?;
    Ok(HttpResponse::Ok().json(process))
}

/// Delete process
#[utoipa::path(
    delete,
    path = "/api/process/{id}",
    params(("id" = u64, Path, description = "Process ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Process not found"),
        (status = 409, description = "Process still has verifications")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn delete_process(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM processes WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Process not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
