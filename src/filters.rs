use crate::items::{SearchLocation, SearchRequestBody, SearchResult, SearchStrategy};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    Product { product: SearchResult, is_positive: bool },
    Text { text_query: String, is_positive: bool },
}

impl SearchFilter {
    pub fn product(product: SearchResult, is_positive: bool) -> Self {
        SearchFilter::Product {
            product,
            is_positive,
        }
    }

    pub fn text(text_query: impl Into<String>, is_positive: bool) -> Self {
        SearchFilter::Text {
            text_query: text_query.into(),
            is_positive,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            SearchFilter::Product { is_positive, .. } | SearchFilter::Text { is_positive, .. } => {
                *is_positive
            }
        }
    }

    /// Product id or query text.
    pub fn key(&self) -> &str {
        match self {
            SearchFilter::Product { product, .. } => &product.product_id,
            SearchFilter::Text { text_query, .. } => text_query,
        }
    }

    /// Two filters are the same entry when kind, key and polarity agree.
    pub fn same_entry(&self, other: &SearchFilter) -> bool {
        let same_kind = matches!(
            (self, other),
            (SearchFilter::Product { .. }, SearchFilter::Product { .. })
                | (SearchFilter::Text { .. }, SearchFilter::Text { .. })
        );
        same_kind && self.key() == other.key() && self.is_positive() == other.is_positive()
    }
}

/// Like/dislike filters, most recent first, no duplicate (key, polarity) pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<SearchFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[SearchFilter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn contains(&self, filter: &SearchFilter) -> bool {
        self.filters.iter().any(|f| f.same_entry(filter))
    }

    pub fn add(&mut self, filter: SearchFilter) -> &[SearchFilter] {
        if !self.contains(&filter) {
            self.filters.insert(0, filter);
        }
        &self.filters
    }

    pub fn add_product(&mut self, product: SearchResult, is_positive: bool) -> &[SearchFilter] {
        self.add(SearchFilter::product(product, is_positive))
    }

    /// Trims the query first; a blank query adds nothing.
    pub fn add_text(&mut self, query: &str, is_positive: bool) -> &[SearchFilter] {
        let query = query.trim();
        if query.is_empty() {
            return &self.filters;
        }
        self.add(SearchFilter::text(query, is_positive))
    }

    pub fn remove(&mut self, filter: &SearchFilter) -> &[SearchFilter] {
        self.filters.retain(|f| !f.same_entry(filter));
        &self.filters
    }

    pub fn clear(&mut self) -> &[SearchFilter] {
        self.filters.clear();
        &self.filters
    }

    pub fn positive_ids(&self) -> Vec<String> {
        self.product_ids(true)
    }

    pub fn negative_ids(&self) -> Vec<String> {
        self.product_ids(false)
    }

    fn product_ids(&self, positive: bool) -> Vec<String> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                SearchFilter::Product {
                    product,
                    is_positive,
                } if *is_positive == positive => Some(product.product_id.clone()),
                _ => None,
            })
            .collect()
    }

    // Text filters go out as plain queries whatever their polarity.
    pub fn queries(&self) -> Vec<String> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                SearchFilter::Text { text_query, .. } => Some(text_query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn request_body(
        &self,
        location: Option<SearchLocation>,
        new_strategy: bool,
        limit: Option<u32>,
    ) -> SearchRequestBody {
        SearchRequestBody {
            positive: self.positive_ids(),
            negative: self.negative_ids(),
            queries: Some(self.queries()),
            strategy: Some(SearchStrategy::from_flag(new_strategy).as_str().to_string()),
            location,
            limit,
        }
    }
}

impl From<Vec<SearchFilter>> for FilterSet {
    fn from(filters: Vec<SearchFilter>) -> Self {
        let mut set = FilterSet::new();
        // Keep the given order; later duplicates lose.
        for filter in filters {
            if !set.contains(&filter) {
                set.filters.push(filter);
            }
        }
        set
    }
}
