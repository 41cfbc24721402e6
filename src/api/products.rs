use crate::{
    api::required_text,
    auth::auth::AuthUser,
    error::ServiceError,
    model::product::{CreateProduct, Product, ProductQuery},
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses((status = 200, description = "Products", body = [Product])),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn list_products(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ServiceError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, customer_id, name
        FROM products
        WHERE (? IS NULL OR customer_id = ?)
        ORDER BY name
        "#,
    )
    .bind(query.client_id)
    .bind(query.client_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(products))
}

/// Create product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 409, description = "Duplicate product or unknown client")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn create_product(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProduct>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;
    let name = required_text(&payload.name, "Name")?;

    let result = sqlx::query("INSERT INTO products (customer_id, name) VALUES (?, ?)")
        .bind(payload.customer_id)
        .bind(name)
        .execute(pool.get_ref())
        .await?;

    let product = Product {
        id: result.last_insert_id(),
        customer_id: payload.customer_id,
        name: name.to_string(),
    };
    info!(product_id = product.id, customer_id = product.customer_id, "Product created");

    Ok(HttpResponse::Created().json(product))
}

/// Delete product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = u64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn delete_product(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Product not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
