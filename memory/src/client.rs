use async_trait::async_trait;
use memchat_core::{ChatMessage, MemoryItem, MemoryProvider};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::MemorySettings;
use crate::errors::{MemoryResult, MemoryStoreError};
use crate::types::{memory_item, result_list, AddRequest, SearchFilters, SearchRequest};

/// Client for the Mem0 platform API
#[derive(Debug, Clone)]
pub struct Mem0Client {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Mem0Client {
    /// Builds a client without contacting the provider.
    pub fn new(api_key: impl Into<String>, settings: &MemorySettings) -> MemoryResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MemoryStoreError::Config(
                "API key is required to initialize the memory client".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MemoryStoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client and validates the API key against the provider.
    pub async fn connect(api_key: impl Into<String>, settings: &MemorySettings) -> MemoryResult<Self> {
        let client = Self::new(api_key, settings)?;
        client.ping().await?;
        info!("Connected to memory provider at {}", client.base_url);
        Ok(client)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Token {}", self.api_key))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Checks that the provider is reachable and accepts the key.
    pub async fn ping(&self) -> MemoryResult<()> {
        let response = self
            .request(self.client.get(self.url("/v1/ping/")))
            .send()
            .await
            .map_err(|e| MemoryStoreError::Request(format!("Failed to reach memory provider: {}", e)))?;
        check_status(response).await?;
        Ok(())
    }

    /// Raw search: returns every result object that carries memory text.
    #[instrument(skip(self, query))]
    pub async fn search_memories(&self, query: &str, user_id: &str) -> MemoryResult<Vec<MemoryItem>> {
        let body = SearchRequest {
            query,
            filters: SearchFilters { user_id },
        };
        let response = self
            .request(self.client.post(self.url("/v2/memories/search/")))
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryStoreError::Request(format!("Failed to send search: {}", e)))?;
        let response = check_status(response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| MemoryStoreError::Parsing(format!("Failed to parse search response: {}", e)))?;
        let results = result_list(body).ok_or_else(|| {
            MemoryStoreError::Parsing("Search response has no result list".to_string())
        })?;

        let items: Vec<MemoryItem> = results.iter().filter_map(memory_item).collect();
        debug!(count = items.len(), "Search returned memories");
        Ok(items)
    }

    /// Persists a message sequence; the provider extracts memories from it asynchronously.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub async fn add_memories(&self, messages: &[ChatMessage], user_id: &str) -> MemoryResult<()> {
        let body = AddRequest { messages, user_id };
        let response = self
            .request(self.client.post(self.url("/v1/memories/")))
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryStoreError::Request(format!("Failed to send memories: {}", e)))?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> MemoryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);

    Err(MemoryStoreError::Http {
        status_code: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MemoryProvider for Mem0Client {
    async fn search(&self, query: &str, user_id: &str) -> anyhow::Result<Vec<MemoryItem>> {
        Ok(self.search_memories(query, user_id).await?)
    }

    async fn add(&self, messages: &[ChatMessage], user_id: &str) -> anyhow::Result<()> {
        Ok(self.add_memories(messages, user_id).await?)
    }
}
