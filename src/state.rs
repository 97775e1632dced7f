//! Search session state: results, filters, location and strategy flag.
//!
//! Every mutator that changes what the backend should see is paired with a
//! `*_and_refresh` style helper that immediately refetches. Failed fetches are
//! logged and leave the current results in place.

use std::sync::Arc;

use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{error, info};

use crate::{
    config::Settings,
    error::SearchError,
    filters::{FilterSet, SearchFilter},
    items::{SearchLocation, SearchResult},
    Client,
};

#[derive(Debug)]
pub struct SearchState {
    client: Client,
    results: Vec<SearchResult>,
    filters: FilterSet,
    location: Option<SearchLocation>,
    new_strategy: bool,
    limit: Option<u32>,
    radius_km: f64,
}

impl SearchState {
    pub fn new(settings: &Settings) -> Result<Self, SearchError> {
        Ok(Self::with_client(Client::new(settings)?, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            results: Vec::new(),
            filters: FilterSet::new(),
            location: None,
            new_strategy: true,
            limit: settings.effective_limit(),
            radius_km: settings.radius_km,
        }
    }

    /// Builds the state and performs the initial fetch with no filters.
    pub async fn mount(settings: &Settings) -> Result<Self, SearchError> {
        let mut state = Self::new(settings)?;
        state.retrieve_results(None, None, None).await;
        Ok(state)
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn filters(&self) -> &[SearchFilter] {
        self.filters.as_slice()
    }

    pub fn location(&self) -> Option<SearchLocation> {
        self.location
    }

    pub fn new_strategy(&self) -> bool {
        self.new_strategy
    }

    pub fn add_filter(&mut self, filter: SearchFilter) -> Vec<SearchFilter> {
        self.filters.add(filter).to_vec()
    }

    pub fn add_product_filter(
        &mut self,
        product: SearchResult,
        is_positive: bool,
    ) -> Vec<SearchFilter> {
        self.filters.add_product(product, is_positive).to_vec()
    }

    pub fn add_text_filter(&mut self, query: &str, is_positive: bool) -> Vec<SearchFilter> {
        self.filters.add_text(query, is_positive).to_vec()
    }

    pub fn remove_filter(&mut self, filter: &SearchFilter) -> Vec<SearchFilter> {
        self.filters.remove(filter).to_vec()
    }

    pub fn clear_filters(&mut self) -> Vec<SearchFilter> {
        self.filters.clear().to_vec()
    }

    pub fn set_location(&mut self, location: Option<SearchLocation>) {
        self.location = location;
    }

    pub fn set_new_strategy(&mut self, value: bool) {
        self.new_strategy = value;
    }

    /// Fetches results for the given inputs, falling back to the current state
    /// for any `None`. Errors are logged and the previous results are kept.
    pub async fn retrieve_results(
        &mut self,
        filters: Option<&[SearchFilter]>,
        location: Option<Option<SearchLocation>>,
        new_strategy: Option<bool>,
    ) {
        if let Err(err) = self.try_retrieve_results(filters, location, new_strategy).await {
            error!("Search failed: {err}");
        }
    }

    pub async fn try_retrieve_results(
        &mut self,
        filters: Option<&[SearchFilter]>,
        location: Option<Option<SearchLocation>>,
        new_strategy: Option<bool>,
    ) -> Result<&[SearchResult], SearchError> {
        let results = fetch(
            &self.client,
            &self.request_filters(filters),
            location.unwrap_or(self.location),
            new_strategy.unwrap_or(self.new_strategy),
            self.limit,
        )
        .await?;
        self.results = results;
        Ok(&self.results)
    }

    fn request_filters(&self, filters: Option<&[SearchFilter]>) -> FilterSet {
        match filters {
            Some(f) => FilterSet::from(f.to_vec()),
            None => self.filters.clone(),
        }
    }

    pub async fn refresh(&mut self) {
        self.retrieve_results(None, None, None).await;
    }

    pub async fn text_search(&mut self, query: Option<&str>) {
        let Some(query) = query else { return };
        self.add_text_filter(query, true);
        self.refresh().await;
    }

    pub async fn like(&mut self, product: SearchResult) {
        self.add_product_filter(product, true);
        self.refresh().await;
    }

    pub async fn dislike(&mut self, product: SearchResult) {
        self.add_product_filter(product, false);
        self.refresh().await;
    }

    pub async fn remove_and_refresh(&mut self, filter: &SearchFilter) {
        self.remove_filter(filter);
        self.refresh().await;
    }

    pub async fn clear_and_refresh(&mut self) {
        self.clear_filters();
        self.refresh().await;
    }

    /// Drops every filter and the location, then fetches unfiltered results.
    pub async fn reset(&mut self) {
        self.set_location(None);
        self.clear_filters();
        self.retrieve_results(None, Some(None), None).await;
    }

    /// Searches around a point using the configured radius.
    pub async fn search_near(&mut self, latitude: f64, longitude: f64) -> Result<(), SearchError> {
        let location = SearchLocation::new(latitude, longitude, self.radius_km)?;
        info!("Searching near {latitude}, {longitude}");
        self.set_location(Some(location));
        self.refresh().await;
        Ok(())
    }

    pub async fn clear_location(&mut self) {
        self.set_location(None);
        self.refresh().await;
    }

    pub async fn toggle_strategy(&mut self) {
        self.set_new_strategy(!self.new_strategy);
        self.refresh().await;
    }
}

async fn fetch(
    client: &Client,
    filters: &FilterSet,
    location: Option<SearchLocation>,
    new_strategy: bool,
    limit: Option<u32>,
) -> Result<Vec<SearchResult>, SearchError> {
    let body = filters.request_body(location, new_strategy, limit);
    client.search(&body).await
}

/// State shared between tasks. Fetches spawned here are not sequenced:
/// whichever response resolves last overwrites the results.
#[derive(Clone, Debug)]
pub struct SharedSearchState {
    inner: Arc<RwLock<SearchState>>,
}

impl SharedSearchState {
    pub fn new(state: SearchState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn inner(&self) -> &Arc<RwLock<SearchState>> {
        &self.inner
    }

    /// Snapshots the current inputs and fetches without holding the lock.
    pub async fn spawn_retrieve(&self) -> JoinHandle<()> {
        let (client, filters, location, new_strategy, limit) = {
            let state = self.inner.read().await;
            (
                state.client.clone(),
                state.filters.clone(),
                state.location,
                state.new_strategy,
                state.limit,
            )
        };
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match fetch(&client, &filters, location, new_strategy, limit).await {
                Ok(results) => inner.write().await.results = results,
                Err(err) => error!("Search failed: {err}"),
            }
        })
    }

    pub async fn results(&self) -> Vec<SearchResult> {
        self.inner.read().await.results.clone()
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::filters::test::product;
    use crate::test::{sample_products, spawn_server};

    #[tokio::test]
    async fn test_mount_fetches_once_with_empty_filters() {
        let (settings, requests) = spawn_server(StatusCode::OK, sample_products()).await;
        let state = SearchState::mount(&settings).await.unwrap();

        assert_eq!(state.results().len(), 2);
        let requests = requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].positive.is_empty());
        assert!(requests[0].negative.is_empty());
        assert_eq!(requests[0].strategy.as_deref(), Some("best_score"));
        assert!(requests[0].location.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_results() {
        let (settings, _) = spawn_server(StatusCode::BAD_GATEWAY, json!({})).await;
        let mut state = SearchState::new(&settings).unwrap();
        state.results = vec![product("kept")];

        state.refresh().await;
        assert_eq!(state.results(), &[product("kept")]);
        assert!(state.try_retrieve_results(None, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_like_dislike_and_text_search_build_request() {
        let (settings, requests) = spawn_server(StatusCode::OK, json!([])).await;
        let mut state = SearchState::new(&settings).unwrap();

        state.like(product("1")).await;
        state.dislike(product("2")).await;
        state.text_search(Some("curry")).await;
        state.text_search(None).await;

        let requests = requests.lock().await;
        assert_eq!(requests.len(), 3);
        let last = &requests[2];
        assert_eq!(last.positive, vec!["1"]);
        assert_eq!(last.negative, vec!["2"]);
        assert_eq!(last.queries, Some(vec!["curry".to_string()]));
        assert_eq!(state.filters().len(), 3);
    }

    #[tokio::test]
    async fn test_explicit_arguments_override_state() {
        let (settings, requests) = spawn_server(StatusCode::OK, json!([])).await;
        let mut state = SearchState::new(&settings).unwrap();
        state.add_product_filter(product("1"), true);
        state.set_location(Some(SearchLocation::new(1.0, 2.0, 3.0).unwrap()));

        let remaining = state.remove_filter(&SearchFilter::product(product("1"), true));
        state
            .retrieve_results(Some(remaining.as_slice()), Some(None), Some(false))
            .await;

        let requests = requests.lock().await;
        assert!(requests[0].positive.is_empty());
        assert!(requests[0].location.is_none());
        assert_eq!(requests[0].strategy.as_deref(), Some("average_vector"));
        assert!(state.location().is_some());
    }

    #[tokio::test]
    async fn test_location_and_strategy_refetch() {
        let (settings, requests) = spawn_server(StatusCode::OK, json!([])).await;
        let mut state = SearchState::new(&settings).unwrap();

        state.search_near(49.47, 8.48).await.unwrap();
        state.toggle_strategy().await;
        state.clear_location().await;
        assert!(state.search_near(120.0, 8.48).await.is_err());

        let requests = requests.lock().await;
        assert_eq!(requests.len(), 3);
        let near = requests[0].location.unwrap();
        assert_eq!(near.radius_km, settings.radius_km);
        assert_eq!(requests[1].strategy.as_deref(), Some("average_vector"));
        assert!(requests[2].location.is_none());
        assert!(!state.new_strategy());
    }

    #[tokio::test]
    async fn test_clear_and_remove_refresh() {
        let (settings, requests) = spawn_server(StatusCode::OK, json!([])).await;
        let mut state = SearchState::new(&settings).unwrap();
        state.add_text_filter("noodles", true);
        state.add_product_filter(product("5"), false);

        state
            .remove_and_refresh(&SearchFilter::text("noodles", true))
            .await;
        assert_eq!(state.filters(), &[SearchFilter::product(product("5"), false)]);
        state.clear_and_refresh().await;
        assert!(state.filters().is_empty());

        let requests = requests.lock().await;
        assert_eq!(requests[0].negative, vec!["5"]);
        assert_eq!(requests[0].queries, Some(vec![]));
        assert!(requests[1].negative.is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_location_and_filters() {
        let (settings, requests) = spawn_server(StatusCode::OK, json!([])).await;
        let mut state = SearchState::new(&settings).unwrap();
        state.add_product_filter(product("3"), true);
        state.search_near(49.47, 8.48).await.unwrap();

        state.reset().await;
        assert!(state.location().is_none());
        assert!(state.filters().is_empty());

        let requests = requests.lock().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[0].location.is_some());
        assert!(requests[1].location.is_none());
        assert!(requests[1].positive.is_empty());
    }

    #[tokio::test]
    async fn test_shared_spawn_retrieve() {
        let (settings, requests) = spawn_server(StatusCode::OK, sample_products()).await;
        let shared = SharedSearchState::new(SearchState::new(&settings).unwrap());
        shared
            .inner()
            .write()
            .await
            .add_text_filter("falafel", true);

        let first = shared.spawn_retrieve().await;
        let second = shared.spawn_retrieve().await;
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(shared.results().await.len(), 2);
        assert_eq!(requests.lock().await.len(), 2);
    }
}
