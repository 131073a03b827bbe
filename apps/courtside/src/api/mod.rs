use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::notifications::{Notification, NotificationId};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid api endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(StatusCode),
}

/// Typed client for the notification REST endpoints. The backend is a
/// black box behind these three routes; responses to the mutations are
/// ignored beyond the status code.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::InvalidEndpoint(format!("{base_url}: {err}")))?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(8))
            .no_proxy()
            .build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidEndpoint(format!("{path}: {err}")))
    }

    /// `GET /notifications/`: the seed list, newest first.
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let endpoint = self.endpoint("notifications/")?;
        let response = self.http.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// `POST /notifications/{id}/read/`.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let endpoint = self.endpoint(&format!("notifications/{id}/read/"))?;
        let response = self.http.post(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }

    /// `POST /notifications/read-all/`.
    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        let endpoint = self.endpoint("notifications/read-all/")?;
        let response = self.http.post(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }
}
