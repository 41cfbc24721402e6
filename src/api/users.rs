use crate::{
    auth::{auth::AuthUser, password::hash_password, token_version::TokenVersions},
    error::ServiceError,
    model::{
        role::{Role, RoleInfo, all_roles},
        user::{CreateUser, TeamQuery, UpdatePassword, User, UserListResponse, UserQuery},
    },
    utils::{
        db_utils::{Column, as_object, build_update_sql, execute_update},
        pagination::PageWindow,
    },
};
use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error, info};

const USER_COLUMNS: &str =
    "id, name, username, role_id, supervisor_id, identifier, is_active";

const UPDATABLE: &[Column] = &[
    ("name", "name"),
    ("username", "username"),
    ("roleId", "role_id"),
    ("supervisorId", "supervisor_id"),
    ("identifier", "identifier"),
    ("isActive", "is_active"),
];

/// Changing any of these invalidates the user's tokens.
const SESSION_FIELDS: &[&str] = &["username", "roleId", "isActive"];

const MIN_PASSWORD_LEN: usize = 6;

fn check_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn hashed(password: &str) -> Result<String, ServiceError> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ServiceError::Internal
    })
}

async fn find_user(pool: &MySqlPool, user_id: u64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn list_by_role(
    pool: &MySqlPool,
    role: Role,
    supervisor_id: Option<u64>,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE role_id = ? AND is_active = TRUE
        AND (? IS NULL OR supervisor_id = ?)
        ORDER BY name
        "#
    ))
    .bind(role.id())
    .bind(supervisor_id)
    .bind(supervisor_id)
    .fetch_all(pool)
    .await
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_manager_or_admin()?;

    let window = PageWindow::new(query.page, query.per_page);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));

    let where_clause = r#"
        WHERE (? IS NULL OR role_id = ?)
        AND (? IS NULL OR name LIKE ? OR username LIKE ? OR identifier LIKE ?)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {where_clause}"))
        .bind(query.role_id)
        .bind(query.role_id)
        .bind(&search)
        .bind(&search)
        .bind(&search)
        .bind(&search)
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {USER_COLUMNS} FROM users {where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    debug!(page = window.page, per_page = window.per_page, "Fetching users");

    let data = sqlx::query_as::<_, User>(&data_sql)
        .bind(query.role_id)
        .bind(query.role_id)
        .bind(&search)
        .bind(&search)
        .bind(&search)
        .bind(&search)
        .bind(i64::from(window.per_page))
        .bind(i64::from(window.offset))
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}

/// Create user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username or identifier already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;

    let name = payload.name.trim();
    let username = payload.username.trim().to_lowercase();
    if name.is_empty() || username.is_empty() {
        return Err(ServiceError::bad_request("Name and username are required"));
    }
    check_password(&payload.password)?;
    if Role::from_id(payload.role_id).is_none() {
        return Err(ServiceError::bad_request("Unknown role"));
    }

    let identifier = payload
        .identifier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, username, password, role_id, supervisor_id, identifier)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&username)
    .bind(hashed(&payload.password)?)
    .bind(payload.role_id)
    .bind(payload.supervisor_id)
    .bind(identifier)
    .execute(pool.get_ref())
    .await?;

    let user_id = result.last_insert_id();
    info!(user_id, username = %username, "User created");

    let user = find_user(pool.get_ref(), user_id)
        .await?
        .ok_or(ServiceError::Internal)?;

    Ok(HttpResponse::Created().json(user))
}

/// Get user
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    if !auth.is_self(user_id) {
        auth.require_manager_or_admin()?;
    }

    match find_user(pool.get_ref(), user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ServiceError::not_found("User not found")),
    }
}

/// Update user
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body(content = Object, description = "Any of name, username, roleId, supervisorId, identifier, isActive"),
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Unknown field or value"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let payload = as_object(&body)?;

    if let Some(role_id) = payload.get("roleId") {
        let valid = role_id
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(Role::from_id)
            .is_some();
        if !valid {
            return Err(ServiceError::bad_request("Unknown role"));
        }
    }
    if payload.get("supervisorId").and_then(Value::as_u64) == Some(user_id) {
        return Err(ServiceError::bad_request("A user cannot supervise themselves"));
    }

    let update = build_update_sql("users", payload, UPDATABLE, user_id)?;
    if execute_update(pool.get_ref(), update).await? == 0
        && find_user(pool.get_ref(), user_id).await?.is_none()
    {
        return Err(ServiceError::not_found("User not found"));
    }

    if SESSION_FIELDS.iter().any(|f| payload.contains_key(*f)) {
        versions.bump(pool.get_ref(), user_id).await?;
        info!(user_id, "User sessions invalidated after account change");
    }

    let user = find_user(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User is still referenced")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    if auth.is_self(user_id) {
        return Err(ServiceError::bad_request("You cannot delete your own account"));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("User not found"));
    }
    versions.bump(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Change password
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/password",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body = UpdatePassword,
    responses(
        (status = 200, description = "Password changed"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn set_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePassword>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    if !auth.is_self(user_id) {
        auth.require_admin()?;
    }
    check_password(&payload.password)?;

    let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed(&payload.password)?)
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("User not found"));
    }
    versions.bump(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed, please log in again" })))
}

/// Force logout a user
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/force-logout",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Sessions invalidated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn force_logout(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    if !versions.bump(pool.get_ref(), user_id).await? {
        return Err(ServiceError::not_found("User not found"));
    }
    info!(user_id, by = auth.user_id, "Forced logout");

    Ok(HttpResponse::Ok().json(json!({ "message": "User has been logged out" })))
}

/// Force logout every user
#[utoipa::path(
    post,
    path = "/api/users/force-logout-all",
    responses((status = 200, description = "All sessions invalidated")),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn force_logout_all(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;

    let affected = versions.bump_all(pool.get_ref()).await?;
    info!(affected, by = auth.user_id, "Forced logout of all users");

    Ok(HttpResponse::Ok().json(json!({
        "message": "All users have been logged out",
        "affected": affected
    })))
}

/// Active supervisors
#[utoipa::path(
    get,
    path = "/api/users/supervisors/list",
    responses((status = 200, description = "Supervisors", body = [User])),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_supervisors(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ServiceError> {
    let users = list_by_role(pool.get_ref(), Role::Supervisor, None).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Active team members, optionally of one supervisor
#[utoipa::path(
    get,
    path = "/api/users/team-members/list",
    params(TeamQuery),
    responses((status = 200, description = "Team members", body = [User])),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_team_members(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeamQuery>,
) -> Result<HttpResponse, ServiceError> {
    let users = list_by_role(pool.get_ref(), Role::TeamMember, query.supervisor_id).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Roles
#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "Every role", body = [RoleInfo])),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_roles(_auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(all_roles())
}
