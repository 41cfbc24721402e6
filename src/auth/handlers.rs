use crate::{
    auth::{
        auth::AuthUser, jwt::generate_access_token, password::verify_password,
        token_version::TokenVersions,
    },
    config::Config,
    error::ServiceError,
    model::{role::Role, user::UserSql},
    models::{LoginReqDto, LoginResponse},
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Credential and account checks on the row fetched for a login.
fn authenticate(db_user: Option<UserSql>, password: &str) -> Result<(UserSql, Role), ServiceError> {
    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
    };

    if !verify_password(password, &db_user.password) {
        info!(user_id = db_user.id, "Invalid credentials: password mismatch");
        return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
    }

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: account disabled");
        return Err(ServiceError::forbidden("Account is disabled"));
    }

    let role = Role::from_id(db_user.role_id).ok_or_else(|| {
        error!(user_id = db_user.id, role_id = db_user.role_id, "User has unknown role");
        ServiceError::Internal
    })?;

    Ok((db_user, role))
}

/// Login
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid credentials"
        })),
        (status = 403, description = "Account disabled")
    ),
    tag = "Users"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, versions, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    versions: web::Data<TokenVersions>,
) -> Result<HttpResponse, ServiceError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ServiceError::bad_request("Username and password are required"));
    }

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, name, username, password, role_id, is_active, token_version
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(user.username.trim())
    .fetch_optional(pool.get_ref())
    .await?;

    let (db_user, role) = authenticate(db_user, &user.password)?;

    let token = generate_access_token(
        db_user.id,
        &db_user.username,
        db_user.role_id,
        db_user.token_version,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        ServiceError::Internal
    })?;

    versions.remember(db_user.id, db_user.token_version).await;

    // last_login_at is informational, a failure here does not fail the login
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        role,
        role_id: db_user.role_id,
        user_id: db_user.id,
        name: db_user.name,
        username: db_user.username,
    }))
}

/// Logout: invalidates every token the caller holds
#[utoipa::path(
    post,
    path = "/api/users/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn logout(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    versions: web::Data<TokenVersions>,
) -> Result<HttpResponse, ServiceError> {
    versions.bump(pool.get_ref(), auth.user_id).await?;
    info!(user_id = auth.user_id, "Logged out");

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use actix_web::{ResponseError, body::to_bytes, http::StatusCode};
    use serde_json::{Value, json};

    fn user(password: &str, role_id: u8, is_active: bool) -> UserSql {
        UserSql {
            id: 2,
            name: "Meera Shah".to_string(),
            username: "meera".to_string(),
            password: hash_password(password).unwrap(),
            role_id,
            is_active,
            token_version: 0,
        }
    }

    async fn rejection(err: ServiceError) -> (StatusCode, Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn bad_credentials_are_indistinguishable() {
        let invalid = json!({ "message": "Invalid credentials" });

        let (status, body) = rejection(authenticate(None, "secret1").unwrap_err()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, invalid);

        let wrong = authenticate(Some(user("secret1", 2, true)), "secret2").unwrap_err();
        let (status, body) = rejection(wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, invalid);
    }

    #[actix_web::test]
    async fn disabled_account_is_forbidden() {
        let err = authenticate(Some(user("secret1", 2, false)), "secret1").unwrap_err();
        let (status, body) = rejection(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "Account is disabled" }));
    }

    #[test]
    fn valid_login_resolves_role() {
        let (db_user, role) = authenticate(Some(user("secret1", 3, true)), "secret1").unwrap();
        assert_eq!(db_user.id, 2);
        assert_eq!(role, Role::Supervisor);

        assert!(matches!(
            authenticate(Some(user("secret1", 42, true)), "secret1"),
            Err(ServiceError::Internal)
        ));
    }
}
