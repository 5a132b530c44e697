//! Shared types and pure logic for the storefind merchant finder:
//! configuration, geographic value types, distance math, and ranking.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod geo;
pub mod merchant;
pub mod rank;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{distance_km, GeoPoint};
pub use merchant::Merchant;
pub use rank::{rank_merchants, RankParams, RankedMerchant, RankedResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
