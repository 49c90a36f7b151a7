//! HTTP client for the portfolio backend.
//!
//! Every request goes through the same pipeline: attach the bearer token held
//! by the session, send with the configured timeout, classify any failure into
//! an [`ApiError`], and decode the JSON body. A 401 additionally signs the
//! session out and sends the navigator to the login route.

use log::{debug, error, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use stockfolio_core::errors::Error as CoreError;
use stockfolio_core::session::{AuthSession, Navigator};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAuth {
    /// Attach the bearer token; a 401 forces a logout.
    Bearer,
    /// Sign-in and registration calls.
    Anonymous,
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<AuthSession>,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be initialized.
    pub fn new(
        config: &ClientConfig,
        session: Arc<AuthSession>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CoreError::Unexpected(format!("Failed to initialize HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create headers for an API request.
    fn headers(&self, auth: RequestAuth) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        if auth == RequestAuth::Bearer {
            if let Some(token) = self.session.token() {
                let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    CoreError::Unexpected("Invalid access token format".to_string())
                })?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.client.get(self.url(path));
        self.send(builder, Method::GET, path, RequestAuth::Bearer)
            .await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.client.get(self.url(path)).query(query);
        self.send(builder, Method::GET, path, RequestAuth::Bearer)
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, auth: RequestAuth) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.client.post(self.url(path)).json(body);
        self.send(builder, Method::POST, path, auth).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.client.put(self.url(path)).json(body);
        self.send(builder, Method::PUT, path, RequestAuth::Bearer)
            .await
    }

    /// Any success status counts; the body, if there is one, is not read.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let builder = self.client.delete(self.url(path));
        self.execute(builder, Method::DELETE, path, RequestAuth::Bearer)
            .await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
        auth: RequestAuth,
    ) -> Result<T> {
        let (status, body) = self.execute(builder, method.clone(), path, auth).await?;

        // Some PUTs answer 204 with no body
        let text = if body.trim().is_empty() {
            "null"
        } else {
            body.as_str()
        };
        serde_json::from_str(text).map_err(|e| {
            error!(
                "[Api] Failed to deserialize response of {} {}: {}",
                method, path, e
            );
            ApiError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            }
        })
    }

    /// Sends the request and returns the status and raw body of a success response.
    async fn execute(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
        auth: RequestAuth,
    ) -> Result<(StatusCode, String)> {
        debug!("[Api] {} {}", method, path);

        let response = builder
            .headers(self.headers(auth)?)
            .send()
            .await
            .map_err(|e| {
                warn!("[Api] {} {} failed: {}", method, path, e);
                ApiError::from_transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        debug!("[Api] {} {} -> {}", method, path, status);

        if !status.is_success() {
            let err = ApiError::from_response(status, &body);
            if matches!(err, ApiError::Unauthorized(_)) && auth == RequestAuth::Bearer {
                if let Err(e) = self.session.handle_unauthorized(self.navigator.as_ref()) {
                    error!("[Api] Failed to clear session after 401: {}", e);
                }
            } else if !err.is_not_found() {
                warn!("[Api] {} {} -> {}: {}", method, path, status, err);
            }
            return Err(err);
        }
        Ok((status, body))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
