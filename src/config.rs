use std::{fs, io, path::Path};

use serde::Deserialize;

use crate::error::SearchError;

pub const DEFAULT_CONFIG_FILE: &str = "food-discovery.toml";
pub const MAX_SEARCH_LIMIT: u32 = 100;
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub limit: Option<u32>,
    pub radius_km: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 10,
            user_agent: concat!("food-discovery-rs/", env!("CARGO_PKG_VERSION")).into(),
            limit: None,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file if it exists, then `FOOD_DISCOVERY_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SearchError> {
        let explicit = path.is_some();
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let mut settings = match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw)?,
            Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(err) => {
                return Err(SearchError::Config(format!(
                    "cannot read {}: {err}",
                    path.display()
                )))
            }
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self, SearchError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<(), SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("FOOD_DISCOVERY_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = var("FOOD_DISCOVERY_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("FOOD_DISCOVERY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("FOOD_DISCOVERY_LIMIT") {
            self.limit = Some(parse_var("FOOD_DISCOVERY_LIMIT", &v)?);
        }
        if let Some(v) = var("FOOD_DISCOVERY_RADIUS_KM") {
            self.radius_km = parse_var("FOOD_DISCOVERY_RADIUS_KM", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SearchError::Config(format!(
                "base_url must be an http(s) url, got `{}`",
                self.base_url
            )));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(SearchError::Config(format!(
                "radius_km must be positive, got {}",
                self.radius_km
            )));
        }
        Ok(())
    }

    /// Configured limit clamped to what the backend accepts.
    pub fn effective_limit(&self) -> Option<u32> {
        self.limit.map(|l| l.clamp(1, MAX_SEARCH_LIMIT))
    }

    pub fn search_url(&self) -> String {
        format!("{}/api/search", self.base_url.trim_end_matches('/'))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SearchError> {
    value
        .trim()
        .parse()
        .map_err(|_| SearchError::Config(format!("{key} has invalid value `{value}`")))
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings =
            Settings::from_toml("base_url = \"https://food.example\"\nlimit = 24\n").unwrap();
        assert_eq!(settings.base_url, "https://food.example");
        assert_eq!(settings.limit, Some(24));
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.radius_km, DEFAULT_RADIUS_KM);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FOOD_DISCOVERY_BASE_URL", "http://10.0.0.1:9000"),
            ("FOOD_DISCOVERY_RADIUS_KM", "2.5"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.base_url, "http://10.0.0.1:9000");
        assert_eq!(settings.radius_km, 2.5);
    }

    #[test]
    fn test_bad_env_value() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|k| (k == "FOOD_DISCOVERY_LIMIT").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Settings::from_toml("limit = \"twelve\""),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/food-discovery.toml");
        let err = Settings::load(Some(path)).unwrap_err();
        match err {
            SearchError::Config(msg) => assert!(msg.contains("/nonexistent/food-discovery.toml")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_limit_clamped() {
        let settings = Settings {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(settings.effective_limit(), Some(MAX_SEARCH_LIMIT));
    }

    #[test]
    fn test_search_url() {
        let settings = Settings {
            base_url: "http://localhost:8000/".into(),
            ..Default::default()
        };
        assert_eq!(settings.search_url(), "http://localhost:8000/api/search");
        assert!(settings.validate().is_ok());
        let bad = Settings {
            base_url: "localhost".into(),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
