//! Async client for the GitHub REST v3 API.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header;
use tracing::{debug, warn};

use crate::types::{ApiErrorBody, CreateRepository, PutContents, Repository};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("gitfolder/", env!("CARGO_PKG_VERSION"));

/// Characters escaped inside a single URL path segment.
///
/// Everything outside the RFC 3986 unreserved set. `/` never appears inside
/// a segment; segments are encoded one at a time.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors from the GitHub API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository creation rejected because the name is taken.
    #[error("repository already exists")]
    AlreadyExists,

    /// Any other non-2xx response. `message` is the service-reported text,
    /// passed through verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },
}

/// Client for the two endpoints the upload flow needs.
pub struct Client {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl Client {
    /// Creates a client against api.github.com.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client against an explicit base URL (testable).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let base_url = base_url.into();
        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a repository for the authenticated user.
    ///
    /// `POST /user/repos`. A name-taken rejection maps to
    /// [`Error::AlreadyExists`] so callers can suggest switching to the
    /// existing-repository mode.
    pub async fn create_repository(&self, req: &CreateRepository) -> Result<Repository, Error> {
        let url = format!("{}/user/repos", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::ACCEPT, ACCEPT_JSON)
            .json(req)
            .send()
            .await?;

        if resp.status().is_success() {
            let repo: Repository = resp.json().await?;
            debug!(repo = %repo.full_name, "repository created");
            return Ok(repo);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        warn!(status, "repository creation rejected");
        Err(classify_create_error(status, &body))
    }

    /// Writes one file to a repository path on the target branch.
    ///
    /// `PUT /repos/{owner}/{repo}/contents/{path}`. `path` is a forward-slash
    /// repository-relative path; each segment is percent-encoded.
    pub async fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        req: &PutContents,
    ) -> Result<(), Error> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            encode_segment(owner),
            encode_segment(repo),
            encode_path(path),
        );
        let resp = self
            .http
            .put(&url)
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::ACCEPT, ACCEPT_JSON)
            .json(req)
            .send()
            .await?;

        if resp.status().is_success() {
            debug!(path, "content written");
            return Ok(());
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        warn!(path, status, "content write rejected");
        Err(parse_api_error(status, &body))
    }
}

/// Parses a non-2xx response body into the closed error taxonomy.
fn parse_api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {status}"));
    Error::Api { status, message }
}

/// Like [`parse_api_error`], but recognizes the name-taken rejection.
fn classify_create_error(status: u16, body: &str) -> Error {
    match parse_api_error(status, body) {
        Error::Api { message, .. } if message.contains("already exists") => Error::AlreadyExists,
        err => err,
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Percent-encodes each segment of a repository-relative path, keeping `/`.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
