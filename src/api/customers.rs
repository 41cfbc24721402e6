use crate::{
    api::required_text,
    auth::auth::AuthUser,
    error::ServiceError,
    model::customer::{CreateCustomer, Customer, CustomerQuery},
    utils::db_utils::{Column, as_object, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;

const UPDATABLE: &[Column] = &[
    ("name", "name"),
    ("contactPerson", "contact_person"),
    ("email", "email"),
    ("phone", "phone"),
];

async fn find_customer(pool: &MySqlPool, id: u64) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT id, name, contact_person, email, phone FROM customers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// List clients
#[utoipa::path(
    get,
    path = "/api/clients",
    params(CustomerQuery),
    responses((status = 200, description = "Clients", body = [Customer])),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn list_customers(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse, ServiceError> {
    let search = optional(&query.search).map(|s| format!("%{s}%"));

    let customers = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, contact_person, email, phone
        FROM customers
        WHERE (? IS NULL OR name LIKE ?)
        ORDER BY name
        "#,
    )
    .bind(&search)
    .bind(&search)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(customers))
}

/// Create client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Client created", body = Customer),
        (status = 409, description = "Client already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn create_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCustomer>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let name = required_text(&payload.name, "Name")?;

    let result = sqlx::query(
        "INSERT INTO customers (name, contact_person, email, phone) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(optional(&payload.contact_person))
    .bind(optional(&payload.email))
    .bind(optional(&payload.phone))
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(customer_id = id, name, "Client created");

    let customer = find_customer(pool.get_ref(), id)
        .await?
        .ok_or(ServiceError::Internal)?;
    Ok(HttpResponse::Created().json(customer))
}

/// Get client
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = u64, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = Customer),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn get_customer(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    find_customer(pool.get_ref(), path.into_inner())
        .await?
        .map(|c| HttpResponse::Ok().json(c))
        .ok_or_else(|| ServiceError::not_found("Client not found"))
}

/// Update client
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = u64, Path, description = "Client ID")),
    request_body(content = Object, description = "Any of name, contactPerson, email, phone"),
    responses(
        (status = 200, description = "Client updated", body = Customer),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn update_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let id = path.into_inner();
    let payload = as_object(&body)?;
    if let Some(name) = payload.get("name") {
        required_text(name.as_str().unwrap_or_default(), "Name")?;
    }

    let update = build_update_sql("customers", payload, UPDATABLE, id)?;
    execute_update(pool.get_ref(), update).await?;

    find_customer(pool.get_ref(), id)
        .await?
        .map(|c| HttpResponse::Ok().json(c))
        .ok_or_else(|| ServiceError::not_found("Client not found"))
}

/// Delete client
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = u64, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Client still has products or processes")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn delete_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM customers WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Client not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
