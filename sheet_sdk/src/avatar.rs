use crate::error::{Result, SheetError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Default portrait source (randomuser-shaped API).
pub const DEFAULT_AVATAR_API_URL: &str = "https://randomuser.me/api/";

/// A randomly generated person, used to seed or reset the sheet.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub age: String,
    pub portrait: String,
}

/// Source of portraits and random identities. Injected as a trait object so
/// reconciliation is testable without the network.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    /// One portrait URL per call.
    async fn fetch_portrait(&self) -> Result<String>;

    /// A full random identity, for character reset.
    async fn fetch_identity(&self) -> Result<Identity>;
}

/// HTTP implementation over the randomuser-shaped API.
pub struct RandomUserApi {
    base_url: String,
    client: Client,
}

impl RandomUserApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    async fn fetch_user(&self) -> Result<RandomUser> {
        let response: RandomUserResponse = self
            .client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SheetError::Other("avatar source returned no results".to_string()))
    }
}

impl Default for RandomUserApi {
    fn default() -> Self {
        Self::new(DEFAULT_AVATAR_API_URL)
    }
}

#[async_trait]
impl AvatarSource for RandomUserApi {
    async fn fetch_portrait(&self) -> Result<String> {
        Ok(self.fetch_user().await?.picture.large)
    }

    async fn fetch_identity(&self) -> Result<Identity> {
        let user = self.fetch_user().await?;
        Ok(Identity {
            name: format!("{} {}", user.name.first, user.name.last),
            age: user.dob.age.to_string(),
            portrait: user.picture.large,
        })
    }
}

// Internal response types
#[derive(Deserialize)]
struct RandomUserResponse {
    results: Vec<RandomUser>,
}

#[derive(Deserialize)]
struct RandomUser {
    name: UserName,
    dob: UserDob,
    picture: UserPicture,
}

#[derive(Deserialize)]
struct UserName {
    first: String,
    last: String,
}

#[derive(Deserialize)]
struct UserDob {
    age: u32,
}

#[derive(Deserialize)]
struct UserPicture {
    large: String,
}
