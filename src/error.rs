use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::{Value, json};

/// Error type returned by every handler.
///
/// The body is always `{ "message": ... }` so clients can surface it verbatim.
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Rejection that carries a structured report next to the message
    #[display(fmt = "{}", message)]
    Unprocessable { message: String, details: Value },

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({ "message": self.to_string() });

        if let ServiceError::Unprocessable {
            details: Value::Object(extra),
            ..
        } = self
        {
            if let Value::Object(map) = &mut body {
                for (key, value) in extra {
                    map.insert(key.clone(), value.clone());
                }
            }
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                tracing::warn!(error = %e, "Duplicate record rejected");
                return ServiceError::Conflict("Record already exists".to_string());
            }
            if db_err.is_foreign_key_violation() {
                tracing::warn!(error = %e, "Foreign key violation");
                return ServiceError::Conflict(
                    "Referenced record does not exist or is still in use".to_string(),
                );
            }
        }

        tracing::error!(error = %e, "Database error");
        ServiceError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: ServiceError) -> (StatusCode, Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn not_found_carries_message() {
        let (status, body) =
            body_json(ServiceError::not_found("Verification entry not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Verification entry not found" }));
    }

    #[actix_web::test]
    async fn unprocessable_merges_details() {
        let err = ServiceError::Unprocessable {
            message: "Import rejected".to_string(),
            details: json!({ "validationErrors": [], "mismatches": [{ "row": 2, "name": "X" }] }),
        };
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Import rejected");
        assert_eq!(body["mismatches"][0]["row"], 2);
    }

    #[actix_web::test]
    async fn internal_hides_details() {
        let (status, body) = body_json(ServiceError::from(sqlx::Error::RowNotFound)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
    }
}
