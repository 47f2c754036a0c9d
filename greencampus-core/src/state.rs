use std::sync::Arc;

use greencampus_models::{seed, Client};
use greencampus_validator::{GeminiConfig, GeminiValidator, ProofValidator, SimulationValidator};

use crate::config::Configuration;
use crate::error::GreenCampusResult;

/// Everything a request handler or CLI command needs.
#[derive(Clone)]
pub struct GreenCampusState {
    pub config: Configuration,
    pub client: Client,
    pub validator: Arc<dyn ProofValidator>,
}

impl GreenCampusState {
    #[instrument(skip(config))]
    pub async fn new(config: Configuration) -> GreenCampusResult<Self> {
        debug!("Opening database {}", config.database_url);
        let client = Client::connect(&config.database_url).await?;
        client.migrate().await?;
        if config.seed_on_start {
            seed::seed_missions(&client).await?;
            seed::seed_users(&client).await?;
        }
        let validator = build_validator(&config)?;
        Ok(Self::with_parts(config, client, validator))
    }

    pub fn with_parts(
        config: Configuration,
        client: Client,
        validator: Arc<dyn ProofValidator>,
    ) -> Self {
        Self {
            config,
            client,
            validator,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for GreenCampusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenCampusState")
            .field("config", &self.config)
            .field("client", &self.client)
            .field("validator", &self.validator.name())
            .finish()
    }
}

/// Gemini when a key is configured, the simulation validator otherwise.
pub fn build_validator(config: &Configuration) -> GreenCampusResult<Arc<dyn ProofValidator>> {
    match &config.gemini_api_key {
        Some(api_key) if !api_key.is_empty() => {
            info!("Validating photos with Gemini model {}", config.gemini_model);
            Ok(Arc::new(GeminiValidator::new(
                crate::http_client(config)?,
                GeminiConfig {
                    base_url: config.gemini_base_url.clone(),
                    model: config.gemini_model.clone(),
                    api_key: api_key.clone(),
                    schema: config.validator_schema,
                },
            )))
        }
        _ => {
            let validator = match config.simulation_accept_rate {
                Some(rate) => SimulationValidator::stochastic(rate, config.simulation_points),
                None => SimulationValidator::always_accept(config.simulation_points),
            };
            warn!(
                "No Gemini API key configured, photos are accepted with probability {}",
                validator.accept_rate()
            );
            Ok(Arc::new(validator))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_validator_selection() {
        let config = Configuration::for_tests();
        assert_eq!("simulation", build_validator(&config).unwrap().name());

        let config = Configuration {
            gemini_api_key: Some("key".to_string()),
            ..Configuration::for_tests()
        };
        assert_eq!("gemini", build_validator(&config).unwrap().name());
    }

    #[tokio::test]
    async fn test_state_seeds_on_start() -> GreenCampusResult<()> {
        let config = Configuration {
            seed_on_start: true,
            ..Configuration::for_tests()
        };
        let state = GreenCampusState::new(config).await?;
        assert!(state.client().mission("m4").await?.is_some());
        Ok(())
    }
}
