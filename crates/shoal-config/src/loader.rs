//! Configuration loading

use crate::{Config, ConfigFormat};
use regex::Regex;
use shoal_core::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match (env::var(var_name), default_value) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(Error::Config(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Load and validate configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = load_from_file(path)?;

    crate::validator::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::time::Duration;

    const YAML_CONFIG: &str = r#"
server:
  listen: "127.0.0.1:8080"
  shutdown_timeout: "10s"

assets:
  root: "./dist"
  mount: "/assets"

precompression:
  enabled: true
  max_size: 4194304

logging:
  level: "debug"
  format: "json"
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.assets.mount, "/assets");
        assert_eq!(config.precompression.max_size, 4 * 1024 * 1024);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[server]
listen = "0.0.0.0:3000"

[precompression]
max_size = 1024
"#;
        let config = load_from_str(toml, ConfigFormat::Toml).unwrap();

        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.precompression.max_size, 1024);
        assert!(config.precompression.enabled);
    }

    #[test]
    fn test_load_json() {
        let json = r#"{"server": {"listen": "127.0.0.1:9000"}, "precompression": {"enabled": false}}"#;
        let config = load_from_str(json, ConfigFormat::Json).unwrap();

        assert!(!config.precompression.enabled);
        assert_eq!(config.precompression.max_size, 2 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_yaml() {
        let invalid = "invalid: [yaml";
        let result = load_from_str(invalid, ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("SHOAL_TEST_LOADER_PORT", "9090");

        let config = load_from_str(
            r#"
server:
  listen: "${SHOAL_TEST_LOADER_HOST:-127.0.0.1}:${SHOAL_TEST_LOADER_PORT}"
"#,
            ConfigFormat::Yaml,
        )
        .unwrap();

        assert_eq!(config.server.listen.to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_missing_env_var_without_default() {
        let result = load_from_str(
            "server:\n  listen: \"${SHOAL_TEST_LOADER_UNSET_VAR}\"\n",
            ConfigFormat::Yaml,
        );

        match result {
            Err(Error::Config(message)) => assert!(message.contains("SHOAL_TEST_LOADER_UNSET_VAR")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoal.yaml");
        fs::write(&path, YAML_CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.assets.root, std::path::PathBuf::from("./dist"));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoal.json");
        fs::write(
            &path,
            r#"{"server": {"listen": "127.0.0.1:0"}, "precompression": {"max_size": 0}}"#,
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }
}
