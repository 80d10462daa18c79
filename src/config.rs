use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryTable};

/// Runtime settings read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: String,
    pub scoring_config_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let max_connections = match env::var("PORTAL_MAX_CONNECTIONS") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidMaxConnections(value))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            max_connections,
            log_level: env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            scoring_config_path: env::var("PORTAL_SCORING_CONFIG").ok().map(PathBuf::from),
        })
    }

    pub fn scoring(&self) -> Result<ScoringConfig, ConfigError> {
        match &self.scoring_config_path {
            Some(path) => ScoringConfig::from_path(path),
            None => Ok(ScoringConfig::default()),
        }
    }
}

/// Weight and cap tables for both scoring schemes.
///
/// `evaluation_weights` sum to 100, so a researcher at or above every cap scores
/// exactly 100 on the bounded scale. `comparison_weights` double as the point
/// value each activity contributes to trend buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub evaluation_weights: CategoryTable<f64>,
    pub evaluation_caps: CategoryTable<f64>,
    pub comparison_weights: CategoryTable<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            evaluation_weights: CategoryTable::from_fn(|category| match category {
                Category::Research => 25.0,
                Category::Conferences => 10.0,
                Category::Courses => 8.0,
                Category::Seminars => 5.0,
                Category::Workshops => 5.0,
                Category::Committees => 7.0,
                Category::Supervision => 8.0,
                Category::Reviewing => 5.0,
                Category::Journals => 7.0,
                Category::Positions => 4.0,
                Category::Volunteering => 3.0,
                Category::FieldVisits => 3.0,
                Category::Assignments => 3.0,
                Category::Certificates => 4.0,
                Category::ThankYouLetters => 3.0,
            }),
            evaluation_caps: CategoryTable::from_fn(|category| match category {
                Category::Research => 8.0,
                Category::Conferences => 6.0,
                Category::Courses => 6.0,
                Category::Seminars => 5.0,
                Category::Workshops => 5.0,
                Category::Committees => 5.0,
                Category::Supervision => 4.0,
                Category::Reviewing => 6.0,
                Category::Journals => 3.0,
                Category::Positions => 2.0,
                Category::Volunteering => 4.0,
                Category::FieldVisits => 4.0,
                Category::Assignments => 5.0,
                Category::Certificates => 5.0,
                Category::ThankYouLetters => 5.0,
            }),
            comparison_weights: CategoryTable::from_fn(|category| match category {
                Category::Research => 5.0,
                Category::Conferences => 2.0,
                Category::Courses => 2.0,
                Category::Seminars => 1.0,
                Category::Workshops => 1.0,
                Category::Committees => 2.0,
                Category::Supervision => 3.0,
                Category::Reviewing => 1.0,
                Category::Journals => 3.0,
                Category::Positions => 2.0,
                Category::Volunteering => 1.0,
                Category::FieldVisits => 1.0,
                Category::Assignments => 1.0,
                Category::Certificates => 1.0,
                Category::ThankYouLetters => 1.0,
            }),
        }
    }
}

impl ScoringConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadScoring {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScoringConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseScoring {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, weight) in self.evaluation_weights.iter() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight { category, value: *weight });
            }
        }
        for (category, weight) in self.comparison_weights.iter() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight { category, value: *weight });
            }
        }
        for (category, cap) in self.evaluation_caps.iter() {
            if !cap.is_finite() || *cap <= 0.0 {
                return Err(ConfigError::InvalidCap { category, value: *cap });
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORTAL_MAX_CONNECTIONS must be a positive integer, got '{0}'")]
    InvalidMaxConnections(String),
    #[error("unable to read scoring config {path}")]
    ReadScoring {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scoring config {path} is not valid JSON for every category")]
    ParseScoring {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("weight for {category} must be finite and non-negative, got {value}")]
    InvalidWeight { category: Category, value: f64 },
    #[error("cap for {category} must be finite and positive, got {value}")]
    InvalidCap { category: Category, value: f64 },
}
