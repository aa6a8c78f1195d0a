// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, applied in order:
//! 1. TOML file (base values, missing keys take built-in defaults)
//! 2. Environment variables (`COMLINK_*`, runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::validation::validate_config;
use crate::{ComlinkConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "comlink.toml";

/// Environment variable naming an explicit config file
const CONFIG_PATH_ENV: &str = "COMLINK_CONFIG_PATH";

/// Override keys as (environment variable, CLI key)
const OVERRIDE_KEYS: &[(&str, &str)] = &[
    ("COMLINK_PORT", "port"),
    ("COMLINK_BAUD", "baud"),
    ("COMLINK_DATA_BITS", "data_bits"),
    ("COMLINK_PARITY", "parity"),
    ("COMLINK_STOP_BITS", "stop_bits"),
    ("COMLINK_TIMEOUT_MODE", "timeout_mode"),
    ("COMLINK_READ_TIMEOUT_MS", "read_timeout_ms"),
    ("COMLINK_WRITE_TIMEOUT_MS", "write_timeout_ms"),
    ("COMLINK_INPUT_CAPACITY", "input_capacity"),
    ("COMLINK_OUTPUT_CAPACITY", "output_capacity"),
    ("COMLINK_LOG_LEVEL", "log_level"),
];

/// Find the comlink configuration file
///
/// Search order:
/// 1. `COMLINK_CONFIG_PATH` environment variable
/// 2. Current working directory: `./comlink.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        for ancestor in cwd.ancestors().skip(1).take(5) {
            search_paths.push(ancestor.join(CONFIG_FILE_NAME));
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load, override and validate the configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, [`find_config_file`] is used.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found, contains invalid TOML, or the
/// result fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ComlinkConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ComlinkConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `COMLINK_PORT` -> `port.name`
/// - `COMLINK_BAUD`, `COMLINK_DATA_BITS`, `COMLINK_PARITY`, `COMLINK_STOP_BITS` -> `port.settings.*`
/// - `COMLINK_TIMEOUT_MODE` -> `timeouts.mode` (`blocking`, `finite`, `non_blocking`)
/// - `COMLINK_READ_TIMEOUT_MS`, `COMLINK_WRITE_TIMEOUT_MS` -> `timeouts.*`
/// - `COMLINK_INPUT_CAPACITY`, `COMLINK_OUTPUT_CAPACITY` -> `buffers.*`
/// - `COMLINK_LOG_LEVEL` -> `logging.level`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut ComlinkConfig) {
    for (env_key, key) in OVERRIDE_KEYS {
        if let Ok(value) = env::var(env_key) {
            apply_override(config, key, &value);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys are the environment names lower-cased without the `COMLINK_` prefix,
/// e.g. `{"port": "COM4", "baud": "9600", "timeout_mode": "blocking"}`.
pub fn apply_cli_overrides(config: &mut ComlinkConfig, cli_args: &HashMap<String, String>) {
    for (_, key) in OVERRIDE_KEYS {
        if let Some(value) = cli_args.get(*key) {
            apply_override(config, key, value);
        }
    }
}

fn apply_override(config: &mut ComlinkConfig, key: &str, value: &str) {
    match key {
        "port" => config.port.name = value.to_string(),
        "baud" => set_parsed(&mut config.port.settings.baud, value),
        "data_bits" => set_parsed(&mut config.port.settings.data_bits, value),
        "parity" => set_parsed(&mut config.port.settings.parity, value),
        "stop_bits" => set_parsed(&mut config.port.settings.stop_bits, value),
        "timeout_mode" => set_parsed(&mut config.timeouts.mode, value),
        "read_timeout_ms" => set_parsed(&mut config.timeouts.read_timeout_ms, value),
        "write_timeout_ms" => set_parsed(&mut config.timeouts.write_timeout_ms, value),
        "input_capacity" => set_parsed(&mut config.buffers.input_capacity, value),
        "output_capacity" => set_parsed(&mut config.buffers.output_capacity, value),
        "log_level" => config.logging.level = value.to_string(),
        _ => {}
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse() {
        *slot = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comlink_driver::{Parity, TimeoutMode};
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_override_env() {
        for (env_key, _) in OVERRIDE_KEYS {
            env::remove_var(env_key);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();

        env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[port]").unwrap();
        writeln!(file, "name = \"/dev/ttyACM0\"").unwrap();
        writeln!(file, "[buffers]").unwrap();
        writeln!(file, "input_capacity = 512").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.port.name, "/dev/ttyACM0");
        assert_eq!(config.buffers.input_capacity, 512);
        assert_eq!(config.buffers.output_capacity, 4096);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[port\nname = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_env();
        let mut config = ComlinkConfig::default();

        env::set_var("COMLINK_PORT", "COM7");
        env::set_var("COMLINK_BAUD", "57600");
        env::set_var("COMLINK_PARITY", "odd");
        env::set_var("COMLINK_TIMEOUT_MODE", "non-blocking");
        env::set_var("COMLINK_OUTPUT_CAPACITY", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_env();

        assert_eq!(config.port.name, "COM7");
        assert_eq!(config.port.settings.baud, 57_600);
        assert_eq!(config.port.settings.parity, Parity::Odd);
        assert_eq!(config.timeouts.mode, TimeoutMode::NonBlocking);
        // Unparsable value leaves the previous one
        assert_eq!(config.buffers.output_capacity, 4096);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ComlinkConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("port".to_string(), "COM2".to_string());
        cli_args.insert("read_timeout_ms".to_string(), "25".to_string());
        cli_args.insert("log_level".to_string(), "trace".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.port.name, "COM2");
        assert_eq!(config.timeouts.read_timeout_ms, 25);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[port]").unwrap();
        writeln!(file, "name = \"file-port\"").unwrap();
        writeln!(file, "[port.settings]").unwrap();
        writeln!(file, "baud = 9600").unwrap();
        writeln!(file, "[timeouts]").unwrap();
        writeln!(file, "read_timeout_ms = 10").unwrap();

        env::set_var("COMLINK_PORT", "env-port");
        env::set_var("COMLINK_BAUD", "19200");

        let mut cli_args = HashMap::new();
        cli_args.insert("port".to_string(), "cli-port".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));
        clear_override_env();
        let config = config.unwrap();

        // CLI wins for port, env wins for baud, file wins for read timeout
        assert_eq!(config.port.name, "cli-port");
        assert_eq!(config.port.settings.baud, 19_200);
        assert_eq!(config.timeouts.read_timeout_ms, 10);
        assert_eq!(config.timeouts.write_timeout_ms, 200);
    }

    #[test]
    fn test_load_validates_result() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[buffers]\ninput_capacity = 0\n").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
