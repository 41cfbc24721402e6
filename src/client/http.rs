//! Typed HTTP client for the REST API.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::error::{ClientError, ClientResult};
use crate::client::session::SessionStore;
use crate::models::{LoginReqDto, LoginResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    /// Including the API prefix, e.g. `http://localhost:8080/api`
    base_url: String,
    store: SessionStore,
    session: RwLock<Option<LoginResponse>>,
}

impl ApiClient {
    /// Build a client and hydrate the session from `store`.
    pub fn new(base_url: impl Into<String>, store: SessionStore) -> ClientResult<Self> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        let session = store.load()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            session: RwLock::new(session),
        })
    }

    pub fn session(&self) -> Option<LoginResponse> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
    }

    fn set_session(&self, session: Option<LoginResponse>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Forget the session in memory and on disk.
    pub fn clear_session(&self) -> ClientResult<()> {
        self.set_session(None);
        self.store.clear()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Server `message` field, else the body text, else the status reason.
    async fn error_message(status: StatusCode, response: Response) -> String {
        let text = response.text().await.unwrap_or_default();

        serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Send with the bearer token. A 401 clears the session.
    async fn send_authed(&self, request: RequestBuilder) -> ClientResult<Response> {
        let token = self.token().ok_or(ClientError::NotLoggedIn)?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = Self::error_message(status, response).await;
        if status == StatusCode::UNAUTHORIZED {
            info!(message = %message, "Session rejected by server, logging out");
            self.clear_session()?;
            return Err(ClientError::Unauthorized { message });
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!(path, "GET");
        let response = self.send_authed(self.http.get(self.url(path))).await?;
        Self::decode(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        debug!(path, "POST");
        let response = self
            .send_authed(self.http.post(self.url(path)).json(body))
            .await?;
        Self::decode(response).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        debug!(path, "PUT");
        let response = self
            .send_authed(self.http.put(self.url(path)).json(body))
            .await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        debug!(path, "DELETE");
        self.send_authed(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    /// Log in and persist the session. A rejected login carries the
    /// server's message verbatim and leaves any stored session alone.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = LoginReqDto {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(self.url("users/login"))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: Self::error_message(status, response).await,
            });
        }

        let session: LoginResponse = Self::decode(response).await?;
        self.store.save(&session)?;
        self.set_session(Some(session.clone()));
        info!(user_id = session.user_id, "Logged in");

        Ok(session)
    }

    /// Invalidate the token server-side when possible, then forget it locally.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(token) = self.token() {
            let result = self
                .http
                .post(self.url("users/logout"))
                .bearer_auth(token)
                .send()
                .await;
            if let Err(e) = result {
                debug!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.clear_session()
    }
}
