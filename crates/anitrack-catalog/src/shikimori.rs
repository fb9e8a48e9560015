//! Shikimori GraphQL client.
//!
//! Queries are sent as `{query, variables}` so search terms are never
//! spliced into the query text.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use anitrack_models::{ReleaseStatus, Title, TitleId};

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};

/// Public Shikimori GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://shikimori.one/api/graphql";

/// Largest page the API serves; id lookups are chunked to this size.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Number of results returned by a name search.
const SEARCH_LIMIT: usize = 10;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shikimori rejects requests without a descriptive agent.
const USER_AGENT: &str = concat!("anitrack/", env!("CARGO_PKG_VERSION"));

const ANIMES_QUERY: &str = r#"query($search: String, $ids: String, $limit: PositiveInt) {
  animes(search: $search, ids: $ids, limit: $limit) {
    id
    name
    english
    japanese
    status
    episodes
    episodesAired
    url
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<AnimesData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct AnimesData {
    #[serde(default)]
    animes: Vec<RawAnime>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnime {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    english: Option<String>,
    #[serde(default)]
    japanese: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    episodes_aired: Option<u32>,
    #[serde(default)]
    url: Option<String>,
}

impl RawAnime {
    /// Converts to a model title, resolving relative URLs against `site_root`.
    fn into_title(self, site_root: &Url) -> Option<Title> {
        let id = match self.id.parse::<TitleId>() {
            Ok(id) => id,
            Err(e) => {
                warn!(id = %self.id, error = %e, "Skipping catalog entry with non-numeric id");
                return None;
            }
        };

        let url = match self.url.as_deref().map(|u| site_root.join(u)) {
            Some(Ok(url)) => url.to_string(),
            _ => site_root
                .join(&format!("animes/{}", id))
                .map(|u| u.to_string())
                .unwrap_or_default(),
        };

        let name = self
            .name
            .or_else(|| self.english.clone())
            .unwrap_or_else(|| format!("#{}", id));

        Some(Title {
            id,
            name,
            english: self.english,
            japanese: self.japanese,
            status: ReleaseStatus::from_catalog(self.status.as_deref().unwrap_or_default()),
            episodes: self.episodes.unwrap_or(0),
            episodes_aired: self.episodes_aired.unwrap_or(0),
            url,
        })
    }
}

/// Parses a GraphQL response body into titles.
fn parse_titles(body: &str, site_root: &Url) -> Result<Vec<Title>> {
    let response: GraphqlResponse = serde_json::from_str(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(CatalogError::Graphql(messages.join("; ")));
    }

    Ok(response
        .data
        .map(|d| d.animes)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| raw.into_title(site_root))
        .collect())
}

/// Joins ids into the comma-separated form the API expects.
fn join_ids(ids: &[TitleId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Catalog client for the Shikimori GraphQL API.
pub struct ShikimoriClient {
    http: reqwest::Client,
    endpoint: Url,
    site_root: Url,
}

impl ShikimoriClient {
    /// Creates a client for the public endpoint.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a client for a custom endpoint (mirrors, test servers).
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let site_root = endpoint.join("/")?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            site_root,
        })
    }

    /// The endpoint queries are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn query(&self, variables: serde_json::Value) -> Result<Vec<Title>> {
        let body = json!({
            "query": ANIMES_QUERY,
            "variables": variables,
        });

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        parse_titles(&text, &self.site_root)
    }
}

#[async_trait]
impl Catalog for ShikimoriClient {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Title>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let titles = self
            .query(json!({ "search": term, "limit": SEARCH_LIMIT }))
            .await?;
        debug!(term = %term, count = titles.len(), "Catalog search finished");
        Ok(titles)
    }

    async fn search_by_ids(&self, ids: &[TitleId]) -> Result<Vec<Title>> {
        let mut titles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let batch = self
                .query(json!({ "ids": join_ids(chunk), "limit": chunk.len() }))
                .await?;
            titles.extend(batch);
        }
        debug!(requested = ids.len(), resolved = titles.len(), "Catalog id lookup finished");
        Ok(titles)
    }
}
