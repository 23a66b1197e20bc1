//! PokeAPI client
//!
//! Builds resource URLs from a base endpoint plus a path fragment, fetches them
//! through the shared response cache and decodes the JSON bodies. Decoding
//! happens here, after the cache: a malformed body that was cached on a 2xx
//! response surfaces as `ApiError::Decode` on every hit until it expires.

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::fetch::{FetchError, Fetcher};

/// Base URL for PokeAPI v2
pub const POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2/";

/// Errors that can occur when querying PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// Fetching the resource failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response body was not the expected JSON
    #[error("Error unmarshalling JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Fetch(err) if err.is_not_found())
    }
}

/// Typed access to the PokeAPI resources the REPL uses
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    fetcher: Fetcher,
    base_url: String,
}

impl PokeApiClient {
    /// Creates a new client over `fetcher`, rooted at `base_url`
    ///
    /// A trailing slash is added to `base_url` if missing.
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { fetcher, base_url }
    }

    /// URL of the first page of the location-area listing
    pub fn first_location_page_url(&self) -> String {
        format!("{}location-area/", self.base_url)
    }

    /// Fetches one page of location areas
    ///
    /// # Arguments
    /// * `page_url` - A `next`/`previous` URL from an earlier page, or `None`
    ///   for the first page
    pub async fn location_areas(
        &self,
        page_url: Option<&str>,
    ) -> Result<LocationAreaPage, ApiError> {
        match page_url {
            Some(url) => self.get_json(url).await,
            None => self.get_json(&self.first_location_page_url()).await,
        }
    }

    /// Fetches a single location area by name
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        let url = format!("{}location-area/{}", self.base_url, name);
        self.get_json(&url).await
    }

    /// Fetches a creature by name
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        let url = format!("{}pokemon/{}", self.base_url, name);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.fetcher.fetch(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
