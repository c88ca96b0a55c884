use crate::dedup::DedupConfig;
use crate::pipeline::PipelineConfig;
use crate::ranking::DEFAULT_TOP_K;
use crate::scoring::{ScoringWeights, WeightError};
use std::env;
use std::fmt;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_MIN_CANDIDATES: usize = 3;

/// Distinguishes runtime behavior for different stages of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the ranking engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub ranking: RankingConfig,
    pub weights: ScoringWeights,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("COMPS_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("COMPS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("COMPS_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::default_for(environment),
        };

        let top_k = read_number("COMPS_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }
        let workers = read_number("COMPS_WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        let min_candidates = read_number("COMPS_MIN_CANDIDATES", DEFAULT_MIN_CANDIDATES)?;

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights::new(
            read_number("COMPS_WEIGHT_PHYSICAL", defaults.physical())?,
            read_number("COMPS_WEIGHT_LOCATION", defaults.location())?,
            read_number("COMPS_WEIGHT_TEMPORAL", defaults.temporal())?,
            read_number("COMPS_WEIGHT_MARKET", defaults.market())?,
        )
        .map_err(ConfigError::Weights)?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            ranking: RankingConfig {
                top_k,
                workers,
                min_candidates,
            },
            weights,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            weights: self.weights,
            top_k: self.ranking.top_k,
            ..PipelineConfig::default()
        }
    }

    pub fn dedup(&self) -> DedupConfig {
        DedupConfig::default().with_min_candidates(self.ranking.min_candidates)
    }
}

fn read_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

/// Ranking and worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    pub top_k: usize,
    pub workers: usize,
    pub min_candidates: usize,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line events without span context.
    Compact,
    /// Events with timestamps, levels and enclosing spans.
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn default_for(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Production => Self::Full,
            AppEnvironment::Development | AppEnvironment::Test => Self::Compact,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTopK,
    InvalidWorkers,
    InvalidNumber { var: &'static str },
    InvalidLogFormat(String),
    Weights(WeightError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTopK => write!(f, "COMPS_TOP_K must be at least 1"),
            ConfigError::InvalidWorkers => write!(f, "COMPS_WORKERS must be at least 1"),
            ConfigError::InvalidNumber { var } => write!(f, "{var} must be a valid number"),
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "COMPS_LOG_FORMAT '{value}' is not one of compact, full")
            }
            ConfigError::Weights(err) => write!(f, "invalid COMPS_WEIGHT_* settings: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Weights(err) => Some(err),
            _ => None,
        }
    }
}
