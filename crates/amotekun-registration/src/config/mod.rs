use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_API_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LAUNCH_DATE: &str = "2026-02-19";
const DEFAULT_WINDOW_DAYS: u32 = 21;
const DEFAULT_MIN_AGE: u32 = 18;
const DEFAULT_MAX_AGE: u32 = 45;

/// Distinguishes runtime behavior for different stages of the portal.
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

/// Top-level configuration for the registration client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub portal: PortalConfig,
    pub eligibility: EligibilityConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url = env::var("REGISTRATION_API_URL")
            .ok()
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl { value: base_url });
        }

        let timeout_secs = parse_var("REGISTRATION_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?;

        let launch_date = match env::var("PORTAL_LAUNCH_DATE") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidValue {
                    variable: "PORTAL_LAUNCH_DATE",
                    value: raw,
                }
            })?,
            Err(_) => NaiveDate::parse_from_str(DEFAULT_LAUNCH_DATE, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidValue {
                    variable: "PORTAL_LAUNCH_DATE",
                    value: DEFAULT_LAUNCH_DATE.to_string(),
                }
            })?,
        };
        let window_days = parse_var("PORTAL_WINDOW_DAYS", DEFAULT_WINDOW_DAYS)?;

        let min_age = parse_var("ELIGIBILITY_MIN_AGE", DEFAULT_MIN_AGE)?;
        let max_age = parse_var("ELIGIBILITY_MAX_AGE", DEFAULT_MAX_AGE)?;
        if min_age > max_age {
            return Err(ConfigError::InvertedAgeWindow { min_age, max_age });
        }

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            portal: PortalConfig {
                launch_date,
                window_days,
            },
            eligibility: EligibilityConfig { min_age, max_age },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                variable,
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

/// Settings for the remote registration API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn register_url(&self) -> String {
        format!("{}/api/register", self.base_url)
    }
}

/// Registration window published on the landing page.
#[derive(Debug, Clone, Copy)]
pub struct PortalConfig {
    pub launch_date: NaiveDate,
    pub window_days: u32,
}

/// Inclusive age bounds, in whole years, for eligible applicants.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityConfig {
    pub min_age: u32,
    pub max_age: u32,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidApiUrl {
        value: String,
    },
    InvalidValue {
        variable: &'static str,
        value: String,
    },
    InvertedAgeWindow {
        min_age: u32,
        max_age: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidApiUrl { value } => {
                write!(
                    f,
                    "REGISTRATION_API_URL must be an http(s) URL, found '{value}'"
                )
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
            ConfigError::InvertedAgeWindow { min_age, max_age } => write!(
                f,
                "ELIGIBILITY_MIN_AGE ({min_age}) must not exceed ELIGIBILITY_MAX_AGE ({max_age})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
