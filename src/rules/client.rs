use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{ApiReference, LevelEntry, ResourceList, RulesApi, RulesError, SpellDetail};
use crate::config::RulesConfig;

/// `reqwest` client for the D&D 5e SRD API.
///
/// One GET per call; nothing is cached or retried.
#[derive(Clone)]
pub struct Dnd5eClient {
    client: Client,
    base_url: String,
}

impl Dnd5eClient {
    /// Fails only when the HTTP client cannot be built, so a configured
    /// timeout is never silently dropped.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, RulesError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RulesConfig) -> Result<Self, RulesError> {
        Self::new(
            &config.base_url,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RulesError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!("Rules API request to {} failed: {}", url, e);
            RulesError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Rules API {} returned {}", url, status);
            return Err(RulesError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Rules API {} returned unexpected JSON: {}", url, e);
            RulesError::UnexpectedShape {
                url,
                reason: e.to_string(),
            }
        })
    }

    async fn get_list(&self, path: &str) -> Result<Vec<ApiReference>, RulesError> {
        let list: ResourceList = self.get_json(path).await?;
        Ok(list.results)
    }
}

#[async_trait]
impl RulesApi for Dnd5eClient {
    async fn class_levels(&self, class_index: &str) -> Result<Vec<LevelEntry>, RulesError> {
        self.get_json(&format!("/api/classes/{}/levels", class_index))
            .await
    }

    async fn class_spells(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError> {
        self.get_list(&format!("/api/classes/{}/spells", class_index))
            .await
    }

    async fn classes(&self) -> Result<Vec<ApiReference>, RulesError> {
        self.get_list("/api/classes").await
    }

    async fn subclasses(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError> {
        self.get_list(&format!("/api/classes/{}/subclasses", class_index))
            .await
    }

    async fn spells(&self) -> Result<Vec<ApiReference>, RulesError> {
        self.get_list("/api/spells").await
    }

    async fn spell(&self, index: &str) -> Result<SpellDetail, RulesError> {
        self.get_json(&format!("/api/spells/{}", index)).await
    }
}
