use crate::error::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Default remote backend (JSONPlaceholder-shaped `/posts` resource).
pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

/// All sheet rows live under one fixed user on the placeholder API.
pub const SHEET_USER_ID: u64 = 1;

/// Client for the remote persistence collaborator. Each block maps to one
/// `/posts` resource: `title` carries the block kind, `body` the
/// JSON-serialized payload.
#[derive(Clone)]
pub struct PlaceholderClient {
    /// Base URL for the API
    pub base_url: String,
    /// HTTP client
    pub client: Client,
}

impl PlaceholderClient {
    /// Create a new client
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            base_url: api_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client with custom reqwest client
    pub fn with_client(api_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: api_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// List every row belonging to the sheet user. Rows come back as raw
    /// JSON values; the caller filters and parses them leniently so one
    /// malformed row never fails the whole listing.
    pub async fn list_posts(&self) -> Result<Vec<Value>> {
        let url = format!("{}/posts?userId={}", self.base_url, SHEET_USER_ID);
        let rows: Vec<Value> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(rows)
    }

    /// Create a row; returns the backend-assigned id.
    pub async fn create_post(&self, title: &str, body: &str) -> Result<String> {
        let url = format!("{}/posts", self.base_url);
        let response: CreatePostResponse = self
            .client
            .post(&url)
            .json(&json!({
                "title": title,
                "body": body,
                "userId": SHEET_USER_ID,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.id.to_string())
    }

    /// Fully replace a row (PUT semantics).
    pub async fn put_post(&self, server_id: &str, title: &str, body: &str) -> Result<()> {
        let url = format!("{}/posts/{}", self.base_url, server_id);
        self.client
            .put(&url)
            .json(&json!({
                "id": server_id,
                "title": title,
                "body": body,
                "userId": SHEET_USER_ID,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Partially replace a row's `body` (PATCH semantics).
    pub async fn patch_post_body(&self, server_id: &str, body: &str) -> Result<()> {
        let url = format!("{}/posts/{}", self.base_url, server_id);
        self.client
            .patch(&url)
            .json(&json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Delete a row by its backend-assigned id.
    pub async fn delete_post(&self, server_id: &str) -> Result<()> {
        let url = format!("{}/posts/{}", self.base_url, server_id);
        self.client
            .delete(&url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Reachability probe; the placeholder API has no health endpoint, so
    /// a successful listing stands in for one.
    pub async fn ping(&self) -> Result<bool> {
        let url = format!("{}/posts?userId={}", self.base_url, SHEET_USER_ID);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

// Internal response types
#[derive(Deserialize)]
struct CreatePostResponse {
    id: u64,
}
