use super::{
    search::SearchConfig,
    traits::ConfigSection,
    universe::UniverseConfig,
};
use crate::error::AllocError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `ALLOC__SEARCH__MIN_STEP=0.01`.
pub const ENV_PREFIX: &str = "ALLOC";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AllocError> {
        self.search.validate().map_err(|e| section_error::<SearchConfig>(e))?;
        self.universe.validate().map_err(|e| section_error::<UniverseConfig>(e))?;
        Ok(())
    }
}

fn section_error<S: ConfigSection>(error: AllocError) -> AllocError {
    match error {
        AllocError::Configuration(msg) => {
            AllocError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Reads a TOML file, layers `ALLOC__*` environment variables on top and
    /// validates the result before replacing the current configuration.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), AllocError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AllocError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| AllocError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.write_lock()? = config;
        Ok(())
    }

    pub fn load_from_str(&self, contents: &str) -> Result<(), AllocError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| AllocError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.write_lock()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), AllocError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| AllocError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| AllocError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, AllocError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| AllocError::Configuration("Configuration lock poisoned".to_string()))
    }

    /// Applies `f` and keeps the change only if the result still validates.
    pub fn update<F>(&self, f: F) -> Result<(), AllocError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.write_lock()?;
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, AllocError> {
        self.config
            .write()
            .map_err(|_| AllocError::Configuration("Configuration lock poisoned".to_string()))
    }
}
