// Hand-crafted async HTTP client for the project service REST surface.
//
// Base path: /api/
// Auth: bearer session token (injected as a default header)

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    CreateProjectInput, ListQuery, OwnerSummary, ProjectPage, ProjectView, UpdateProjectInput,
};

// ── Error response shape from the service ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the project service.
///
/// Stateless: every method is a single request-response cycle. Session
/// identity rides on a bearer token default header.
pub struct ProjectsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProjectsClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, an optional session token, and transport
    /// settings. The token becomes an `Authorization: Bearer …` default
    /// header on every request.
    pub fn new(
        base_url: &str,
        session_token: Option<&secrecy::SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::Api {
                    status: 0,
                    message: format!("invalid session token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with a single trailing slash so that
    /// joining `api/…` paths works uniformly.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/projects"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── Project endpoints ────────────────────────────────────────────

    /// Fetch one page of projects under the given filters.
    ///
    /// Ordering is server-side: newest-created first.
    pub async fn list(&self, query: &ListQuery) -> Result<ProjectPage, Error> {
        self.get_with_params("api/projects", &query.to_params())
            .await
    }

    /// Fetch a single project by id.
    pub async fn get(&self, id: &str) -> Result<ProjectView, Error> {
        self.get_json(&format!("api/projects/{id}")).await
    }

    /// Create a project. The server assigns id, owner (from the session),
    /// and timestamps.
    pub async fn create(&self, input: &CreateProjectInput) -> Result<ProjectView, Error> {
        self.post("api/projects", input).await
    }

    /// Partially update a project: only present fields change.
    pub async fn update(&self, id: &str, input: &UpdateProjectInput) -> Result<ProjectView, Error> {
        self.put(&format!("api/projects/{id}"), input).await
    }

    /// Hard-delete a project.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("api/projects/{id}"));
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── User endpoints ───────────────────────────────────────────────

    /// Resolve the session's user (id + display name).
    pub async fn current_user(&self) -> Result<OwnerSummary, Error> {
        self.get_json("api/user/current").await
    }

    /// Fetch the assignable owner summaries for the assignee filter.
    pub async fn list_owners(&self) -> Result<Vec<OwnerSummary>, Error> {
        self.get_json("api/users").await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => return Error::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => return Error::Forbidden,
            reqwest::StatusCode::NOT_FOUND => return Error::NotFound,
            _ => {}
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            if let Some(message) = err.error.or(err.message) {
                return Error::Api {
                    status: status.as_u16(),
                    message,
                };
            }
        }

        Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw
            },
        }
    }
}
