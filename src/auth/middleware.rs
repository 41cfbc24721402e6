use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::auth::token_version::TokenVersions;
use crate::config::Config;
use crate::error::ServiceError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
    req.into_response(resp.map_into_boxed_body())
}

/// Verifies the bearer token, checks its version against the user's current
/// one and stores an [`AuthUser`] in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or(ServiceError::Internal)?;
    let versions = req
        .app_data::<Data<TokenVersions>>()
        .cloned()
        .ok_or(ServiceError::Internal)?;
    let pool = req.app_data::<Data<MySqlPool>>().cloned();

    let token = match req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(t) => t.trim().to_string(),
        None => return Ok(reject(req, "Missing Authorization header")),
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected token");
            return Ok(reject(req, "Invalid or expired token"));
        }
    };

    let Some(role) = Role::from_id(claims.role) else {
        return Ok(reject(req, "Invalid role"));
    };

    match versions.current(claims.user_id, pool.as_ref().map(|p| p.get_ref())).await {
        Ok(Some(version)) if version == claims.ver => {}
        Ok(_) => {
            debug!(user_id = claims.user_id, "Stale token version");
            return Ok(reject(req, "Session expired, please log in again"));
        }
        Err(e) => {
            error!(error = %e, user_id = claims.user_id, "Token version lookup failed");
            return Err(ServiceError::Internal.into());
        }
    }

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::{App, HttpResponse, middleware::from_fn, test, web};
    use std::time::Duration;

    const SECRET: &str = "test-secret";

    async fn whoami(auth: AuthUser) -> Result<HttpResponse, ServiceError> {
        auth.require_manager_or_admin()?;
        Ok(HttpResponse::Ok().body(auth.username))
    }

    fn token(user_id: u64, role: Role, version: u32) -> String {
        generate_access_token(user_id, "asha", role.id(), version, SECRET, 60).unwrap()
    }

    async fn versions_with(user_id: u64, version: u32) -> TokenVersions {
        let versions = TokenVersions::new(Duration::from_secs(60));
        versions.remember(user_id, version).await;
        versions
    }

    macro_rules! app {
        ($versions:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Config::for_secret(SECRET)))
                    .app_data(Data::new($versions))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/whoami", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = app!(versions_with(1, 0).await);
        let req = test::TestRequest::get().uri("/api/whoami").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Missing Authorization header");
    }

    #[actix_web::test]
    async fn current_version_passes() {
        let app = app!(versions_with(1, 2).await);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(1, Role::Manager, 2))))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "asha");
    }

    #[actix_web::test]
    async fn bumped_version_forces_logout() {
        let app = app!(versions_with(1, 3).await);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(1, Role::Admin, 2))))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Session expired, please log in again");
    }

    #[actix_web::test]
    async fn unknown_version_without_pool_is_rejected() {
        let app = app!(TokenVersions::new(Duration::from_secs(60)));
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(5, Role::Manager, 0))))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Session expired, please log in again");
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let app = app!(versions_with(1, 0).await);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn role_checks_return_forbidden() {
        let app = app!(versions_with(9, 0).await);
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(9, Role::TeamMember, 0))))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 403);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "You do not have access to this resource");
    }
}
