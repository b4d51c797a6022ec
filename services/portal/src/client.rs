//! HTTP client for the profile REST collaborator

use async_trait::async_trait;
use common::{
    ProfileError, ProfileResult, ProfileUpdate, UserProfile, config::ApiConfig,
};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::info;

/// Calls the portal makes against the profile API
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// `GET /api/user/{email}`; a 404 is reported as [`ProfileError::NotFound`]
    async fn get_profile(&self, email: &str) -> ProfileResult<UserProfile>;

    /// `POST /api/user`
    async fn create_profile(&self, profile: &UserProfile) -> ProfileResult<UserProfile>;

    /// `PUT /api/user/{email}`
    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> ProfileResult<UserProfile>;
}

/// reqwest-backed [`ProfileApi`]
#[derive(Clone)]
pub struct HttpProfileApi {
    client: Client,
    base_url: Url,
}

impl HttpProfileApi {
    /// Create a new client from the API configuration
    pub fn new(config: &ApiConfig) -> ProfileResult<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            ProfileError::Configuration(format!("Invalid API URL {}: {}", config.api_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ProfileError::Configuration(format!(
                "API URL cannot carry a path: {}",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                ProfileError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        info!("Profile API client initialized with URL: {}", base_url);
        Ok(Self { client, base_url })
    }

    /// `/api/user`, or `/api/user/{email}` with the email percent-encoded
    fn user_url(&self, email: Option<&str>) -> ProfileResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ProfileError::Configuration(format!("Invalid API URL: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend(["api", "user"]);
            if let Some(email) = email {
                segments.push(email);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn get_profile(&self, email: &str) -> ProfileResult<UserProfile> {
        let url = self.user_url(Some(email))?;
        info!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(network_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProfileError::NotFound(email.to_string()));
        }

        read_profile(response).await
    }

    async fn create_profile(&self, profile: &UserProfile) -> ProfileResult<UserProfile> {
        let url = self.user_url(None)?;
        info!("POST {} for {}", url, profile.email);

        let response = self
            .client
            .post(url)
            .json(profile)
            .send()
            .await
            .map_err(network_error)?;

        read_profile(response).await
    }

    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> ProfileResult<UserProfile> {
        let url = self.user_url(Some(email))?;
        info!("PUT {}", url);

        let response = self
            .client
            .put(url)
            .json(update)
            .send()
            .await
            .map_err(network_error)?;

        read_profile(response).await
    }
}

fn network_error(err: reqwest::Error) -> ProfileError {
    ProfileError::Network(err.to_string())
}

/// Decode a 2xx profile body, turning any other status into a server error
async fn read_profile(response: Response) -> ProfileResult<UserProfile> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProfileError::Server {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await.map_err(network_error)?;
    serde_json::from_str(&body).map_err(|e| {
        ProfileError::InvalidResponse(format!("Failed to decode profile: {}", e))
    })
}
