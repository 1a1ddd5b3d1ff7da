//! Jira REST API ticket source.
//!
//! Talks to `/rest/api/2` with either a bearer personal access token or
//! basic auth. The HTTP client is async; the client owns a current-thread
//! runtime and blocks on each request so callers stay synchronous.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{SourceError, TicketQuery, TicketSource};
use crate::config::{AuthMethod, JiraConfig};
use crate::model::Ticket;

/// Fields requested from the search endpoint.
const SEARCH_FIELDS: &str = "summary,description,reporter,duedate";

/// Jira ticket source.
pub struct JiraClient {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
    auth: AuthMethod,
}

/// Response from `/rest/api/2/myself`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    display_name: Option<String>,
}

/// Response from `/rest/api/2/search`.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    /// String in API v2; anything else is ignored.
    description: Option<serde_json::Value>,
    reporter: Option<NamedField>,
    duedate: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedField {
    display_name: Option<String>,
    name: Option<String>,
}

/// Browser link for a ticket key.
#[must_use]
pub fn permalink(base_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", base_url.trim_end_matches('/'))
}

impl JiraIssue {
    fn into_ticket(self, base_url: &str) -> Ticket {
        let fields = self.fields;
        let body = fields
            .description
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string);
        let due = fields
            .duedate
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        Ticket {
            permalink: permalink(base_url, &self.key),
            id: self.key,
            title: fields.summary,
            body,
            reporter: fields.reporter.and_then(|r| r.display_name.or(r.name)),
            due,
        }
    }
}

impl JiraClient {
    /// Build a client and verify that the server is reachable and accepts
    /// the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Connection`] if the runtime or HTTP client cannot
    /// be built or the server is unreachable, and [`SourceError::Auth`] if the
    /// credentials are rejected.
    pub fn connect(config: &JiraConfig) -> Result<Self, SourceError> {
        let connection_error = |message: String| SourceError::Connection {
            url: config.url.clone(),
            message,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| connection_error(format!("failed to start runtime: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("thira/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| connection_error(format!("failed to build HTTP client: {e}")))?;

        let jira = Self {
            runtime,
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
            auth: config.auth,
        };

        let user = jira.current_user()?;
        info!(
            url = %jira.base_url,
            user = user.display_name.as_deref().unwrap_or(&jira.username),
            "Connected to Jira"
        );
        Ok(jira)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("Accept", "application/json");

        match self.auth {
            AuthMethod::Bearer => request.bearer_auth(&self.api_token),
            AuthMethod::Basic => request.basic_auth(&self.username, Some(&self.api_token)),
        }
    }

    fn current_user(&self) -> Result<JiraUser, SourceError> {
        let request = self.get("/rest/api/2/myself");

        self.runtime.block_on(async {
            let response = request.send().await.map_err(|e| SourceError::Connection {
                url: self.base_url.clone(),
                message: e.to_string(),
            })?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(SourceError::Auth {
                    url: self.base_url.clone(),
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(SourceError::Connection {
                    url: self.base_url.clone(),
                    message: format!("unexpected HTTP {status} from /myself"),
                });
            }

            response.json::<JiraUser>().await.map_err(|e| SourceError::Connection {
                url: self.base_url.clone(),
                message: format!("unexpected response from /myself: {e}"),
            })
        })
    }
}

impl TicketSource for JiraClient {
    fn fetch(&self, query: &TicketQuery) -> Result<Vec<Ticket>, SourceError> {
        let jql = query.effective_jql();
        debug!(jql, max_results = query.max_results, "Searching Jira");

        let max_results = query.max_results.to_string();
        let request = self.get("/rest/api/2/search").query(&[
            ("jql", jql),
            ("maxResults", max_results.as_str()),
            ("fields", SEARCH_FIELDS),
        ]);

        let issues = self.runtime.block_on(async {
            let response = request.send().await.map_err(|e| {
                if e.is_connect() {
                    SourceError::Connection {
                        url: self.base_url.clone(),
                        message: e.to_string(),
                    }
                } else {
                    SourceError::Query(e.to_string())
                }
            })?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(SourceError::Auth {
                    url: self.base_url.clone(),
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "Jira search failed");
                return Err(SourceError::Query(format!("HTTP {status}: {body}")));
            }

            response
                .json::<SearchResponse>()
                .await
                .map(|r| r.issues)
                .map_err(|e| SourceError::Query(format!("Failed to parse search response: {e}")))
        })?;

        // The server should honor maxResults; enforce it anyway.
        let limit = usize::try_from(query.max_results).unwrap_or(usize::MAX);
        Ok(issues
            .into_iter()
            .take(limit)
            .map(|issue| issue.into_ticket(&self.base_url))
            .collect())
    }
}
