use crate::loader::traits::RecordSource;
use crate::model::LoadError;
use bytes::Bytes;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::{debug, info};

/// Short links (the granular dataset sits behind one) hop a few times.
const MAX_REDIRECTS: usize = 10;

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, LoadError> {
        let client = Client::builder()
            .user_agent("donor-retention/0.1")
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| LoadError::Http {
                location: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, location: &str) -> Result<Bytes, LoadError> {
        info!("Downloading {}", location);
        let http_error = |e: reqwest::Error| LoadError::Http {
            location: location.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(location).send().await.map_err(http_error)?;
        if !response.status().is_success() {
            return Err(LoadError::Status {
                location: location.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        debug!("{} bytes from {}", body.len(), location);
        Ok(body)
    }
}

pub struct FileSource;

#[async_trait::async_trait]
impl RecordSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<Bytes, LoadError> {
        info!("Reading {}", location);
        Ok(Bytes::from(tokio::fs::read(location).await?))
    }
}

/// Routes `http://` and `https://` locations to HTTP, everything else to disk.
pub struct AnySource {
    http: HttpSource,
    file: FileSource,
}

impl AnySource {
    pub fn new() -> Result<Self, LoadError> {
        Ok(Self {
            http: HttpSource::new()?,
            file: FileSource,
        })
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait::async_trait]
impl RecordSource for AnySource {
    async fn fetch(&self, location: &str) -> Result<Bytes, LoadError> {
        if is_remote(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}
