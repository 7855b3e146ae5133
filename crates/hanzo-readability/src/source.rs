//! Document retrieval

use crate::{config::ReadabilityConfig, error::Result, ExtractError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Supplies the raw bytes of the document behind a URL
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloads documents over HTTP(S)
pub struct HttpDocumentSource {
    client: Client,
}

impl HttpDocumentSource {
    /// Create a new HTTP source with the given configuration
    pub fn new(config: &ReadabilityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            })
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn download(&self, source: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(source)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl(format!(
                "unsupported scheme {:?} in {}",
                url.scheme(),
                source
            )));
        }

        tracing::debug!(url = %url, "downloading document");
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Http {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(url = %url, bytes = body.len(), "downloaded document");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_invalid_url_is_a_retrieval_error() {
        let source = HttpDocumentSource::new(&ReadabilityConfig::default()).unwrap();
        let err = source.download("not a url").await.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUrl(_)));
        assert_eq!(err.kind(), ErrorKind::RetrievalFailed);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let source = HttpDocumentSource::new(&ReadabilityConfig::default()).unwrap();
        let err = source.download("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUrl(_)));
    }
}
