// Secondary metadata service (cover, page count, description) matched by title

use serde_json::Value;

use crate::{domain::models::EnrichmentInfo, error::AcquisitionResult};

#[derive(Clone, Debug)]
pub struct EnrichmentClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EnrichmentClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        EnrichmentClient {
            base_url: base_url.into(),
            api_key: None,
            client,
        }
    }

    /// Return a client that sends the given access token; an empty key is ignored.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Look up a single volume by title.
    ///
    /// `Ok(None)` means the service answered but had nothing usable, including
    /// any response whose shape does not match what we expect. `Err` is
    /// reserved for failing to reach the service at all.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, title: &str) -> AcquisitionResult<Option<EnrichmentInfo>> {
        let mut req = self.client.get(&self.base_url).query(&[
            ("q", title),
            ("startIndex", "0"),
            ("maxResults", "1"),
        ]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }
        tracing::debug!(url = %self.base_url, "GET enrichment");

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "enrichment service refused lookup");
            return Ok(None);
        }

        let info = parse_enrichment(&body);
        if info.is_none() {
            tracing::debug!("no enrichment available");
        }
        Ok(info)
    }

    /// Like [`fetch`](Self::fetch), but transport failures also collapse to `None`.
    pub async fn fetch_best_effort(&self, title: &str) -> Option<EnrichmentInfo> {
        match self.fetch(title).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, %title, "enrichment lookup failed, continuing without it");
                None
            }
        }
    }
}

/// Extracts the first volume's cover/page count/description. Every field is
/// required; anything missing or of the wrong type yields `None`.
pub fn parse_enrichment(body: &str) -> Option<EnrichmentInfo> {
    let json: Value = serde_json::from_str(body).ok()?;
    let total = json.get("totalItems")?.as_i64()?;
    if total == 0 {
        return None;
    }
    let volume = json.get("items")?.as_array()?.first()?.get("volumeInfo")?;
    let cover_image = volume.get("imageLinks")?.get("thumbnail")?.as_str()?;
    let page_count = volume.get("pageCount")?.as_i64()?;
    let description = volume.get("description")?.as_str()?;
    Some(EnrichmentInfo {
        cover_image: cover_image.to_string(),
        page_count,
        description: description.to_string(),
    })
}
