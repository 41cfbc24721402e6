use crate::{error::ServiceError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ServiceError::Unauthorized("Missing token".to_string())),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Admin only"))
        }
    }

    /// Configuration, pricing and collection writes.
    pub fn require_manager_or_admin(&self) -> Result<(), ServiceError> {
        self.require_any(&[Role::Admin, Role::Manager])
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), ServiceError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("You do not have access to this resource"))
        }
    }

    pub fn is_self(&self, user_id: u64) -> bool {
        self.user_id == user_id
    }
}
