//! HTTP gateway content store.
//!
//! Resolves a CID through a public or local IPFS gateway:
//! `GET {gateway}/{cid}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::ports::{ContentStore, ContentStoreError};

/// Default public gateway.
pub const DEFAULT_GATEWAY: &str = "https://w3s.link/ipfs";

/// Content store backed by an IPFS HTTP gateway.
#[derive(Clone, Debug)]
pub struct IpfsGatewayStore {
    client: reqwest::Client,
    gateway: String,
}

impl IpfsGatewayStore {
    pub fn new(gateway: impl Into<String>) -> Result<Self, ContentStoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tunnel-market/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContentStoreError::Unavailable(e.to_string()))?;
        Ok(Self::with_client(client, gateway))
    }

    pub fn with_client(client: reqwest::Client, gateway: impl Into<String>) -> Self {
        Self {
            client,
            gateway: gateway.into(),
        }
    }

    /// URL the descriptor for `cid` is fetched from.
    pub fn url_for(&self, cid: &str) -> String {
        format!("{}/{}", self.gateway.trim_end_matches('/'), cid.trim())
    }
}

#[async_trait]
impl ContentStore for IpfsGatewayStore {
    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, ContentStoreError> {
        let url = self.url_for(cid);
        debug!(%url, "Fetching descriptor");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ContentStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ContentStoreError::NotFound(cid.to_string())),
            status => {
                return Err(ContentStoreError::Http {
                    status: status.as_u16(),
                })
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ContentStoreError::Unavailable(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let store = IpfsGatewayStore::with_client(reqwest::Client::new(), "https://w3s.link/ipfs/");
        assert_eq!(store.url_for("bafy"), "https://w3s.link/ipfs/bafy");

        let store = IpfsGatewayStore::with_client(reqwest::Client::new(), DEFAULT_GATEWAY);
        assert_eq!(store.url_for(" bafy "), "https://w3s.link/ipfs/bafy");
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        // Nothing listens on the discard port of localhost.
        let store = IpfsGatewayStore::new("http://127.0.0.1:9").unwrap();
        assert!(store.fetch("bafy").await.is_err());
    }
}
