pub mod config;
pub mod error;
pub mod filters;
pub mod items;
pub mod state;

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info};

pub use crate::config::Settings;
pub use crate::error::SearchError;
pub use crate::filters::{FilterSet, SearchFilter};
pub use crate::items::{
    Position, Product, Restaurant, SearchLocation, SearchRequestBody, SearchResult, SearchStrategy,
};
pub use crate::state::{SearchState, SharedSearchState};

#[derive(Clone, Debug)]
pub struct Client {
    search_url: String,
    reqwest_client: reqwest::Client,
}

impl Client {
    pub fn new(settings: &Settings) -> Result<Self, SearchError> {
        let headers = HeaderMap::from_iter([
            (
                HeaderName::from_str("accept").map_err(config_err)?,
                HeaderValue::from_str("application/json").map_err(config_err)?,
            ),
            (
                HeaderName::from_str("content-type").map_err(config_err)?,
                HeaderValue::from_str("application/json; charset=utf-8").map_err(config_err)?,
            ),
        ]);
        let reqwest_client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            search_url: settings.search_url(),
            reqwest_client,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub async fn search(&self, body: &SearchRequestBody) -> Result<Vec<SearchResult>, SearchError> {
        debug!(
            positive = body.positive.len(),
            negative = body.negative.len(),
            strategy = ?body.strategy,
            "posting search request"
        );
        let response = self
            .reqwest_client
            .post(&self.search_url)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }
        let bytes = response.bytes().await?;
        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        info!("Received {} products", products.len());
        Ok(products.into_iter().map(SearchResult::from).collect())
    }
}

fn config_err(err: impl std::fmt::Display) -> SearchError {
    SearchError::Config(err.to_string())
}
