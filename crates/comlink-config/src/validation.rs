// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every rule is checked and all failures are reported together.

use crate::{ComlinkConfig, ConfigError, ConfigResult};
use comlink_driver::TimeoutMode;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A non-empty port name
/// - Encodable line settings (baud > 0, 5..=8 data bits)
/// - Non-zero timeouts in finite mode
/// - Non-zero buffer capacities
/// - A known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed rule
pub fn validate_config(config: &ComlinkConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every rule violated by `config`, in table order
pub fn collect_errors(config: &ComlinkConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_port(config, &mut errors);
    validate_timeouts(config, &mut errors);
    validate_buffers(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_port(config: &ComlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.port.name.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "port.name".to_string(),
        });
    }

    let settings = &config.port.settings;
    if settings.baud == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "port.settings.baud".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if !(5..=8).contains(&settings.data_bits) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "port.settings.data_bits".to_string(),
            reason: format!("must be between 5 and 8, got {}", settings.data_bits),
        });
    }
}

fn validate_timeouts(config: &ComlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.timeouts.mode != TimeoutMode::Finite {
        return;
    }
    if config.timeouts.read_timeout_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "timeouts.read_timeout_ms".to_string(),
            reason: "must be greater than 0 in finite mode (use non_blocking for polling)"
                .to_string(),
        });
    }
    if config.timeouts.write_timeout_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "timeouts.write_timeout_ms".to_string(),
            reason: "must be greater than 0 in finite mode (use non_blocking for polling)"
                .to_string(),
        });
    }
}

fn validate_buffers(config: &ComlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.buffers.input_capacity == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "buffers.input_capacity".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.buffers.output_capacity == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "buffers.output_capacity".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
}

fn validate_logging(config: &ComlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
}
