use serde::{Deserialize, Serialize};

use crate::error::SearchError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub location: Position,
    pub name: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A product exactly as the search endpoint returns it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub restaurant: Option<Restaurant>,
}

/// Display shape of a product. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub product_image_url: String,
    pub product_restaurant: Option<Restaurant>,
}

impl From<Product> for SearchResult {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name,
            product_description: product.description,
            product_image_url: product.image_url,
            product_restaurant: product.restaurant,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SearchLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl SearchLocation {
    /// Rejects coordinates outside the WGS84 range and non-positive radii.
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self, SearchError> {
        let valid = (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
            && radius_km.is_finite()
            && radius_km > 0.0;
        if !valid {
            return Err(SearchError::InvalidLocation {
                latitude,
                longitude,
                radius_km,
            });
        }
        Ok(Self {
            latitude,
            longitude,
            radius_km,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    BestScore,
    AverageVector,
}

impl SearchStrategy {
    pub fn from_flag(new_strategy: bool) -> Self {
        if new_strategy {
            SearchStrategy::BestScore
        } else {
            SearchStrategy::AverageVector
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::BestScore => "best_score",
            SearchStrategy::AverageVector => "average_vector",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchRequestBody {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SearchLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
