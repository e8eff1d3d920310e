use std::path::PathBuf;
use std::time::Duration;

use md5::{Digest, Md5};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::settings::{CacheSettings, HttpSettings};
use crate::utils::file::{file_age, file_get, file_write};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: StatusCode },
}

/// Cache file stem for a URL: the hex MD5 digest of the URL
pub fn cache_key(url: &str) -> String {
    Md5::digest(url.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Delay before retry number `attempt` (1-based): `backoff_factor * 2^(attempt-1)` seconds
pub fn retry_delay(backoff_factor: f64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16) as i32;
    Duration::try_from_secs_f64((backoff_factor * 2f64.powi(exponent)).max(0.0))
        .unwrap_or(Duration::MAX)
}

/// On-disk cache keyed by URL, valid while the file mtime is younger than `ttl`
#[derive(Debug, Clone)]
struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.cache", cache_key(url)))
    }

    fn get(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        match file_age(&path) {
            Some(age) if age < self.ttl => file_get(&path).ok(),
            _ => None,
        }
    }

    fn put(&self, url: &str, body: &str) -> std::io::Result<()> {
        file_write(&self.path_for(url), body)
    }

    /// Writes `body` to the cache, logging a failed write
    fn store(&self, url: &str, body: &str) {
        if let Err(e) = self.put(url, body) {
            log::warn!("Failed to cache {}: {}", url, e);
        }
    }
}

/// HTTP GET client with bounded exponential retry and an optional response cache
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    settings: HttpSettings,
    cache: Option<ResponseCache>,
}

impl Fetcher {
    pub fn new(http: &HttpSettings, cache: &CacheSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        let cache = cache.enabled.then(|| ResponseCache {
            dir: PathBuf::from(&cache.dir),
            ttl: Duration::from_secs(cache.ttl_secs),
        });

        Ok(Fetcher {
            client,
            settings: http.clone(),
            cache,
        })
    }

    /// Fetches a page with the default user agent
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        let user_agent = self.settings.user_agent.clone();
        self.get_with_agent(url, &user_agent).await
    }

    /// Fetches a Clash YAML subscription with the Clash client user agent
    pub async fn get_clash(&self, url: &str) -> Result<String, FetchError> {
        let user_agent = self.settings.clash_user_agent.clone();
        self.get_with_agent(url, &user_agent).await
    }

    pub async fn get_with_agent(&self, url: &str, user_agent: &str) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url) {
                log::info!("Using cached content for {}", url);
                return Ok(body);
            }
        }

        let body = self.get_uncached(url, user_agent).await?;

        if let Some(cache) = &self.cache {
            cache.store(url, &body);
        }
        Ok(body)
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        self.settings.retry_statuses.contains(&status.as_u16())
    }

    async fn get_uncached(&self, url: &str, user_agent: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            let error = match self
                .client
                .get(url)
                .header(USER_AGENT, user_agent)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.map_err(|source| FetchError::Transport {
                        url: url.to_string(),
                        source,
                    });
                }
                Ok(response) => {
                    let status = response.status();
                    let error = FetchError::Status {
                        url: url.to_string(),
                        status,
                    };
                    if !self.should_retry(status) {
                        return Err(error);
                    }
                    error
                }
                Err(source) => FetchError::Transport {
                    url: url.to_string(),
                    source,
                },
            };

            attempt += 1;
            if attempt > self.settings.max_retries {
                return Err(error);
            }
            let delay = retry_delay(self.settings.backoff_factor, attempt);
            log::warn!(
                "{} (retry {}/{} in {:?})",
                error,
                attempt,
                self.settings.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
