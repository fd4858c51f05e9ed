//! Récupération HTTP / fichiers locaux

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::{Fetch, SourceError};
use crate::config::HttpConfig;

/// Client HTTP (reqwest), avec lecture des chemins locaux
///
/// Les URLs `file://` et les chemins sans schéma sont lus sur le disque.
/// Aucun timeout sauf configuration explicite.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn fetch_http(&self, url: &str) -> Result<Bytes, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;
        debug!(url, bytes = body.len(), "Réponse HTTP reçue");
        Ok(body)
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, SourceError>> {
        async move {
            if is_remote(url) {
                self.fetch_http(url).await
            } else {
                read_local(url).await
            }
        }
        .boxed()
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

async fn read_local(url: &str) -> Result<Bytes, SourceError> {
    let path = url.strip_prefix("file://").unwrap_or(url);
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_string(),
            source,
        })?;
    debug!(path, bytes = data.len(), "Fichier local lu");
    Ok(Bytes::from(data))
}

/// Réponses fixées en mémoire (hors ligne, tests)
///
/// Une URL absente répond HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Bytes>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }
}

impl Fetch for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, SourceError>> {
        let result = self
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: url.to_string(),
                status: 404,
            });
        futures::future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with("mem://a", "hello");
        assert_eq!(fetcher.fetch("mem://a").await.unwrap(), Bytes::from("hello"));
        assert!(matches!(
            fetcher.fetch("mem://b").await,
            Err(SourceError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_reads_local_files() {
        let path = std::env::temp_dir().join("geodash_fetch_test.geojson");
        std::fs::write(&path, "{}").unwrap();

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let plain = path.to_string_lossy().to_string();
        let url = format!("file://{}", plain);
        assert_eq!(fetcher.fetch(&plain).await.unwrap(), Bytes::from("{}"));
        assert_eq!(fetcher.fetch(&url).await.unwrap(), Bytes::from("{}"));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_http_fetcher_missing_file() {
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch("/nonexistent/geodash.kml").await,
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://gist.githubusercontent.com/x/raw/a.geojson"));
        assert!(!is_remote("data/festivais.geojson"));
        assert!(!is_remote("file:///tmp/a.kml"));
    }
}
