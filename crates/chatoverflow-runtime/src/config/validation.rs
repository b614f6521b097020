//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ConnectorConfig, LogLevel, LogOutput, LoggingConfig, OverflowConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &OverflowConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_connectors_config(&config.connectors)?;
    validate_plugins_config(config)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for (module, level) in &logging.filters {
        if module.is_empty() {
            return Err(ConfigError::validation("Log filter module cannot be empty"));
        }
        level.parse::<LogLevel>().map_err(|_| {
            ConfigError::validation(format!(
                "Invalid log level for '{module}': {level}. Valid values are: trace, debug, info, warn, error"
            ))
        })?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_connectors_config(connectors: &[ConnectorConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for connector in connectors {
        if connector.connector_type.is_empty() {
            return Err(ConfigError::missing_field("connectors.type"));
        }
        if connector.key.is_empty() {
            return Err(ConfigError::missing_field("connectors.key"));
        }
        if !connector.settings.is_object() {
            return Err(ConfigError::validation(format!(
                "Settings of connector {}/{} must be a table",
                connector.connector_type, connector.key
            )));
        }

        if !seen.insert((&connector.connector_type, &connector.key)) {
            return Err(ConfigError::DuplicateConnector {
                connector_type: connector.connector_type.clone(),
                key: connector.key.clone(),
            });
        }
    }

    Ok(())
}

fn validate_plugins_config(config: &OverflowConfig) -> ConfigResult<()> {
    if config.plugins.keys().any(String::is_empty) {
        return Err(ConfigError::validation(
            "Plugin configuration section name cannot be empty",
        ));
    }
    Ok(())
}
