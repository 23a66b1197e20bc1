//! Cache-aside HTTP GET over an `ExpiringCache`
//!
//! A fetch first looks the URL up in the cache. On a hit the cached bytes are
//! returned without touching the network. On a miss a single GET is issued;
//! successful (2xx) bodies are stored verbatim under the URL and returned,
//! while transport failures and non-2xx statuses are returned as errors and
//! never cached. Bodies are opaque here: decoding belongs to the caller.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::cache::ExpiringCache;

/// Default timeout applied to every outgoing request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching a URL
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed (DNS, connection, timeout, body read)
    #[error("Error requesting data: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request failed with status code: {code} ({url})", code = .status.as_u16())]
    RemoteStatus {
        /// Status returned by the server
        status: StatusCode,
        /// URL that was requested
        url: String,
    },
}

impl FetchError {
    /// Returns the HTTP status for remote rejections
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Transport(err) => err.status(),
            FetchError::RemoteStatus { status, .. } => Some(*status),
        }
    }

    /// Whether the server reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::RemoteStatus { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Builds the shared HTTP client with a request timeout
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Returns the body for `url`, from `cache` if present, otherwise from the network
///
/// There is no de-duplication of concurrent misses: two callers racing on the
/// same cold URL both issue a request and the later `add` wins.
///
/// # Arguments
/// * `client` - HTTP client used on a cache miss
/// * `url` - URL to fetch; also the cache key
/// * `cache` - Cache consulted first and filled on success
///
/// # Returns
/// * `Ok(Vec<u8>)` - The cached or freshly downloaded body
/// * `Err(FetchError)` - If the request failed or the status was not 2xx
pub async fn fetch_with_cache(
    client: &Client,
    url: &str,
    cache: &ExpiringCache,
) -> Result<Vec<u8>, FetchError> {
    if let Some(body) = cache.get(url) {
        debug!(url, "cache hit");
        return Ok(body);
    }

    debug!(url, "cache miss, requesting");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::RemoteStatus {
            status,
            url: url.to_string(),
        });
    }

    let body = response.bytes().await?.to_vec();
    cache.add(url, body.clone());

    Ok(body)
}

/// An HTTP client paired with the cache it reads through
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    cache: ExpiringCache,
}

impl Fetcher {
    /// Creates a new Fetcher from an existing client and cache
    pub fn new(client: Client, cache: ExpiringCache) -> Self {
        Self { client, cache }
    }

    /// Fetches `url` through the cache
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        fetch_with_cache(&self.client, url, &self.cache).await
    }

    /// The cache this fetcher reads through
    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_cache() -> ExpiringCache {
        ExpiringCache::new(Duration::from_secs(300)).unwrap()
    }

    #[tokio::test]
    async fn test_miss_requests_once_and_caches_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/location-area/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count":1281}"#))
            .expect(1)
            .mount(&server)
            .await;

        let cache = test_cache();
        let url = format!("{}/location-area/", server.uri());

        let body = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap();

        assert_eq!(body, br#"{"count":1281}"#.to_vec());
        assert_eq!(cache.get(&url), Some(body));
    }

    #[tokio::test]
    async fn test_hit_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
            .expect(0)
            .mount(&server)
            .await;

        let cache = test_cache();
        let url = format!("{}/pokemon/pikachu", server.uri());
        cache.add(url.clone(), b"cached".to_vec());

        let body = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap();

        assert_eq!(body, b"cached".to_vec());
    }

    #[tokio::test]
    async fn test_repeated_fetches_hit_network_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(Client::new(), test_cache());
        let url = format!("{}/pokemon/mew", server.uri());

        for _ in 0..5 {
            assert_eq!(fetcher.fetch(&url).await.unwrap(), b"body".to_vec());
        }
    }

    #[tokio::test]
    async fn test_not_found_is_distinguishable_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let cache = test_cache();
        let url = format!("{}/pokemon/missingno", server.uri());

        let err = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("Request failed with status code: 404"));
        assert!(cache.get(&url).is_none(), "Error response should not be cached");

        // Not cached, so a second attempt goes back to the server
        let err = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_is_not_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = test_cache();
        let url = format!("{}/location-area/", server.uri());

        let err = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap_err();

        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_cached_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/json")
                    .set_body_string("invalid json {"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = test_cache();
        let url = server.uri();

        let body = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap();

        assert_eq!(body, b"invalid json {".to_vec());
        assert_eq!(cache.get(&url), Some(b"invalid json {".to_vec()));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_cached() {
        // Bind then release a port so connections to it are refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{}/pokemon/ditto", port);

        let cache = test_cache();
        let err = fetch_with_cache(&Client::new(), &url, &cache).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Error requesting data"));
        assert!(cache.get(&url).is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(50)).unwrap();
        let cache = test_cache();
        let url = server.uri();

        let err = fetch_with_cache(&client, &url, &cache).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(ref e) if e.is_timeout()));
        assert!(cache.is_empty());
    }
}
