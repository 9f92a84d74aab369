//! REST API access for the book tracker backend.
//!
//! DESIGN
//! ======
//! `BackendApi` is the seam every store talks through; `HttpApi` is the
//! `reqwest` implementation and tests substitute in-memory doubles. Endpoint
//! paths are built by small pure helpers so they can be checked without a
//! server.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ApiError::Status` carrying the backend's `error`
//! message for display. Nothing here retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{
    AuthResponse, BookUpdate, LibraryFilters, LibraryResponse, LoginCredentials, MeResponse, RegisterData,
    SearchHistoryResponse, SearchResponse,
};
use crate::config::HttpTimeouts;

pub const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Calls the book tracker backend makes available to the client.
///
/// Methods taking a `token` attach it as a bearer credential when present.
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST /public/auth/login`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError>;

    /// `POST /public/auth/register`. The confirmation payload is passed through untouched.
    async fn register(&self, data: &RegisterData) -> Result<serde_json::Value, ApiError>;

    /// `GET /auth/me`.
    async fn current_user(&self, token: &str) -> Result<MeResponse, ApiError>;

    /// `GET /books/search?q=&limit=`.
    async fn search_books(&self, token: Option<&str>, query: &str, limit: u32) -> Result<SearchResponse, ApiError>;

    /// `GET /books/last-search`.
    async fn last_searches(&self, token: &str) -> Result<SearchHistoryResponse, ApiError>;

    /// `GET /books/my-library` with optional filters.
    async fn my_library(&self, token: Option<&str>, filters: &LibraryFilters) -> Result<LibraryResponse, ApiError>;

    /// `PUT /books/my-library/{id}`.
    async fn update_library_book(&self, token: Option<&str>, book_id: &str, update: &BookUpdate)
    -> Result<(), ApiError>;

    /// `DELETE /books/my-library/{id}`.
    async fn delete_library_book(&self, token: Option<&str>, book_id: &str) -> Result<(), ApiError>;

    /// `GET /public/books/health`.
    async fn health(&self) -> Result<(), ApiError>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn library_book_endpoint(base: &str, book_id: &str) -> String {
    endpoint(base, &format!("books/my-library/{book_id}"))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// =============================================================================
// CLIENT
// =============================================================================

/// `reqwest`-backed [`BackendApi`].
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base: String,
}

impl HttpApi {
    /// Build a client for `base` (e.g. `http://localhost:3001/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let base = base.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, bearer(token)),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ApiError::from_status(status, text));
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let text = self.send(builder).await?;
        decode(&text)
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl BackendApi for HttpApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let request = self
            .http
            .post(endpoint(&self.base, "public/auth/login"))
            .json(credentials);
        self.send_json(request).await
    }

    async fn register(&self, data: &RegisterData) -> Result<serde_json::Value, ApiError> {
        let request = self
            .http
            .post(endpoint(&self.base, "public/auth/register"))
            .json(data);
        self.send_json(request).await
    }

    async fn current_user(&self, token: &str) -> Result<MeResponse, ApiError> {
        let request = self.authorized(self.http.get(endpoint(&self.base, "auth/me")), Some(token));
        self.send_json(request).await
    }

    async fn search_books(&self, token: Option<&str>, query: &str, limit: u32) -> Result<SearchResponse, ApiError> {
        let request = self
            .http
            .get(endpoint(&self.base, "books/search"))
            .query(&[("q", query.to_owned()), ("limit", limit.to_string())]);
        self.send_json(self.authorized(request, token)).await
    }

    async fn last_searches(&self, token: &str) -> Result<SearchHistoryResponse, ApiError> {
        let request = self.authorized(self.http.get(endpoint(&self.base, "books/last-search")), Some(token));
        self.send_json(request).await
    }

    async fn my_library(&self, token: Option<&str>, filters: &LibraryFilters) -> Result<LibraryResponse, ApiError> {
        let request = self
            .http
            .get(endpoint(&self.base, "books/my-library"))
            .query(&filters.query_pairs());
        self.send_json(self.authorized(request, token)).await
    }

    async fn update_library_book(
        &self,
        token: Option<&str>,
        book_id: &str,
        update: &BookUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .put(library_book_endpoint(&self.base, book_id))
            .json(update);
        self.send(self.authorized(request, token)).await?;
        Ok(())
    }

    async fn delete_library_book(&self, token: Option<&str>, book_id: &str) -> Result<(), ApiError> {
        let request = self.http.delete(library_book_endpoint(&self.base, book_id));
        self.send(self.authorized(request, token)).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), ApiError> {
        let request = self
            .http
            .get(endpoint(&self.base, "public/books/health"))
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS));
        self.send(request).await?;
        Ok(())
    }
}
