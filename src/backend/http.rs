use reqwest::Url;
use serde::Deserialize;

use crate::backend::Backend;
use crate::error::{BackendError, Result};
use crate::models::Track;

/// Blocking client for the `/search` and `/stream` endpoints.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base: Url,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<Track>>,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    proxied_url: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| BackendError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BackendError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme `{}`", base.scheme()),
            });
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("fulltrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Appends `name` to the base path, keeping any prefix such as `/api`.
    fn endpoint(&self, name: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidBaseUrl {
                url: self.base.to_string(),
                reason: "cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    fn search_url(&self, query: &str, allow_metadata_only: bool) -> Result<Url> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair(
                "allow_metadata_only",
                if allow_metadata_only { "true" } else { "false" },
            );
        Ok(url)
    }

    fn stream_url(&self, source_url: &str, provider: &str) -> Result<Url> {
        let mut url = self.endpoint("stream")?;
        url.query_pairs_mut()
            .append_pair("url", source_url)
            .append_pair("provider", provider);
        Ok(url)
    }

    fn get_text(&self, url: Url) -> Result<String> {
        tracing::debug!("GET {}", url);
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }
}

impl Backend for HttpBackend {
    fn search(&self, query: &str, allow_metadata_only: bool) -> Result<Vec<Track>> {
        let body = self.get_text(self.search_url(query, allow_metadata_only)?)?;
        parse_search(&body)
    }

    fn resolve_stream(&self, url: &str, provider: &str) -> Result<String> {
        let body = self.get_text(self.stream_url(url, provider)?)?;
        parse_stream(&body)
    }

    fn fetch_cover(&self, url: &str) -> Result<Vec<u8>> {
        let data = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .bytes()?
            .to_vec();
        Ok(data)
    }
}

fn parse_search(body: &str) -> Result<Vec<Track>> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    Ok(resp.results.unwrap_or_default())
}

fn parse_stream(body: &str) -> Result<String> {
    let resp: StreamResponse = serde_json::from_str(body)?;
    resp.proxied_url
        .filter(|u| !u.is_empty())
        .ok_or(BackendError::MissingStreamUrl)
}
