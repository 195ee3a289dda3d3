use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use wardgate_core::settings::api_server::ApiServer;

#[derive(Debug, Deserialize, Clone, Default)]
#[allow(unused)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub api: ApiServer,
}

impl Settings {
    pub fn get_environment() -> Environment {
        Environment::default()
            .prefix("WARDGATE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("WARDGATE_RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("api.bind_address", "0.0.0.0:8080")?
            .set_default("api.upstream_url", "http://127.0.0.1:9000")?
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Self::get_environment());

        let settings: Settings = builder.build()?.try_deserialize()?;

        // The limiter map is part of the deployment contract: a missing or
        // inconsistent tier must fail startup, not surface per-request.
        settings
            .api
            .rate_limiting
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}
