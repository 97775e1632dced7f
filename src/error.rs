use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed with error `{0}`")]
    Http(#[from] reqwest::Error),
    #[error("Search endpoint answered `{status}`: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid location ({latitude}, {longitude}) with radius {radius_km} km")]
    InvalidLocation {
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    },
}

impl From<toml::de::Error> for SearchError {
    fn from(err: toml::de::Error) -> Self {
        SearchError::Config(err.to_string())
    }
}
