use serde::Deserialize;
use std::time::Duration;

use crate::services::rating_store::FilterThresholds;
use crate::services::svdpp::SvdParams;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// CSV file with the book catalog
    #[serde(default = "default_books_path")]
    pub books_path: String,

    /// CSV file with user ratings
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// A book must have strictly more ratings than this to be kept
    #[serde(default = "default_min_book_ratings")]
    pub min_book_ratings: usize,

    /// A user must have strictly more ratings than this to be kept
    #[serde(default = "default_min_user_ratings")]
    pub min_user_ratings: usize,

    /// Number of popular books offered to a new user
    #[serde(default = "default_cold_start_size")]
    pub cold_start_size: usize,

    /// Number of recommendations returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_svd_factors")]
    pub svd_factors: usize,

    #[serde(default = "default_svd_epochs")]
    pub svd_epochs: usize,

    #[serde(default = "default_svd_learning_rate")]
    pub svd_learning_rate: f64,

    #[serde(default = "default_svd_regularization")]
    pub svd_regularization: f64,

    #[serde(default = "default_svd_init_std_dev")]
    pub svd_init_std_dev: f64,

    /// Seed for factor initialisation, keeps fits reproducible
    #[serde(default = "default_svd_seed")]
    pub svd_seed: u64,

    /// Most conversations whose cold-start set is kept
    #[serde(default = "default_session_capacity")]
    pub session_capacity: u64,

    /// Seconds of inactivity after which a conversation's set is dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_books_path() -> String {
    "static/books10k.csv".to_string()
}

fn default_ratings_path() -> String {
    "static/ratings10k.csv".to_string()
}

fn default_min_book_ratings() -> usize {
    100
}

fn default_min_user_ratings() -> usize {
    150
}

fn default_cold_start_size() -> usize {
    5
}

fn default_top_n() -> usize {
    5
}

fn default_svd_factors() -> usize {
    20
}

fn default_svd_epochs() -> usize {
    20
}

fn default_svd_learning_rate() -> f64 {
    0.007
}

fn default_svd_regularization() -> f64 {
    0.02
}

fn default_svd_init_std_dev() -> f64 {
    0.1
}

fn default_svd_seed() -> u64 {
    42
}

fn default_session_capacity() -> u64 {
    10_000
}

fn default_session_idle_secs() -> u64 {
    1800
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            books_path: default_books_path(),
            ratings_path: default_ratings_path(),
            min_book_ratings: default_min_book_ratings(),
            min_user_ratings: default_min_user_ratings(),
            cold_start_size: default_cold_start_size(),
            top_n: default_top_n(),
            svd_factors: default_svd_factors(),
            svd_epochs: default_svd_epochs(),
            svd_learning_rate: default_svd_learning_rate(),
            svd_regularization: default_svd_regularization(),
            svd_init_std_dev: default_svd_init_std_dev(),
            svd_seed: default_svd_seed(),
            session_capacity: default_session_capacity(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Popularity/activity thresholds for the rating store
    pub fn thresholds(&self) -> FilterThresholds {
        FilterThresholds {
            min_book_ratings: self.min_book_ratings,
            min_user_ratings: self.min_user_ratings,
        }
    }

    /// Idle time after which a conversation's cold-start set expires
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Hyperparameters for the SVD++ model
    pub fn svd_params(&self) -> SvdParams {
        SvdParams {
            n_factors: self.svd_factors,
            n_epochs: self.svd_epochs,
            learning_rate: self.svd_learning_rate,
            regularization: self.svd_regularization,
            init_mean: 0.0,
            init_std_dev: self.svd_init_std_dev,
            seed: self.svd_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.min_book_ratings, 100);
        assert_eq!(config.min_user_ratings, 150);
        assert_eq!(config.cold_start_size, 5);
        assert_eq!(config.session_idle_secs, 1800);
        assert_eq!(config.svd_params().n_factors, 20);
        assert_eq!(config.svd_params(), Config::default().svd_params());
    }

    #[test]
    fn test_overrides_from_env() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("TOP_N".to_string(), "10".to_string()),
            ("SVD_SEED".to_string(), "7".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.svd_params().seed, 7);
    }
}
