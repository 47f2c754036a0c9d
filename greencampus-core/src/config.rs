use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use greencampus_validator::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use greencampus_validator::ResponseSchema;

use crate::error::GreenCampusResult;

fn default_database_url() -> String {
    "sqlite://greencampus.db".to_string()
}

fn default_listen_on() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_gemini_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_gemini_base_url() -> url::Url {
    url::Url::parse(DEFAULT_BASE_URL).expect("default Gemini URL is valid")
}

fn default_validator_timeout_secs() -> u64 {
    20
}

fn default_simulation_points() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

/// Runtime configuration, read from the environment (and `.env` if present).
#[derive(serde::Deserialize, serde::Serialize, Clone, securefmt::Debug)]
pub struct Configuration {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_listen_on")]
    pub listen_on: SocketAddr,
    /// Without a key photos are judged by the simulation validator.
    #[serde(skip_serializing, alias = "google_api_key")]
    #[sensitive]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: url::Url,
    #[serde(default = "default_validator_timeout_secs")]
    pub validator_timeout_secs: u64,
    #[serde(default)]
    pub validator_schema: ResponseSchema,
    /// Acceptance probability of the simulation validator. Unset means every photo passes.
    pub simulation_accept_rate: Option<f64>,
    #[serde(default = "default_simulation_points")]
    pub simulation_points: u32,
    #[serde(default = "default_true")]
    pub enforce_cooldown: bool,
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
    #[serde(alias = "https_proxy", alias = "socks_proxy")]
    pub proxy: Option<url::Url>,
}

impl Configuration {
    pub fn from_env() -> GreenCampusResult<Self> {
        Ok(envy::from_env::<Configuration>()?)
    }

    pub fn validator_timeout(&self) -> Duration {
        Duration::from_secs(self.validator_timeout_secs)
    }

    /// Configuration for tests: in-memory friendly defaults, no remote validator.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            seed_on_start: false,
            ..Self::default()
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            listen_on: default_listen_on(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_base_url: default_gemini_base_url(),
            validator_timeout_secs: default_validator_timeout_secs(),
            validator_schema: ResponseSchema::default(),
            simulation_accept_rate: None,
            simulation_points: default_simulation_points(),
            enforce_cooldown: true,
            seed_on_start: true,
            proxy: None,
        }
    }
}
