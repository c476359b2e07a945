// lookups.rs - Library-backed integrations behind one seam

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::OsintError;
use crate::exif_meta::{extract_exif, fetch_image};
use crate::instagram::InstagramClient;
use crate::query::ImageSource;
use crate::whois::WhoisClient;

#[async_trait]
pub trait Lookups: Send + Sync {
    async fn profile(&self, username: &str) -> Result<Value, OsintError>;
    async fn whois(&self, domain: &str) -> Result<Value, OsintError>;
    async fn image_metadata(&self, source: &ImageSource) -> Result<Value, OsintError>;
}

/// Real network-backed lookups
#[derive(Debug, Clone)]
pub struct NetworkLookups {
    http: Client,
    instagram: InstagramClient,
    whois: WhoisClient,
}

impl NetworkLookups {
    pub fn new() -> Self {
        let http = Client::new();

        Self {
            instagram: InstagramClient::new(http.clone()),
            whois: WhoisClient::new(),
            http,
        }
    }

    pub fn with_whois(mut self, whois: WhoisClient) -> Self {
        self.whois = whois;
        self
    }
}

impl Default for NetworkLookups {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Lookups for NetworkLookups {
    async fn profile(&self, username: &str) -> Result<Value, OsintError> {
        self.instagram.profile(username).await
    }

    async fn whois(&self, domain: &str) -> Result<Value, OsintError> {
        self.whois.lookup(domain).await
    }

    async fn image_metadata(&self, source: &ImageSource) -> Result<Value, OsintError> {
        let tags = match source {
            ImageSource::Bytes(bytes) => extract_exif(bytes)?,
            ImageSource::Url(url) => {
                let bytes = fetch_image(&self.http, url).await?;
                extract_exif(&bytes)?
            }
        };
        Ok(Value::Object(tags))
    }
}
