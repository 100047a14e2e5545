use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Load configuration from a file using the config crate
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub fn load_config(config_path: &str) -> Result<GatewayConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let gateway_config: GatewayConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(gateway_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:3000"
health_check:
  enabled: true
  interval_secs: 5
services:
  - service: "users"
    urls:
      - "http://localhost:8001"
      - "http://localhost:8002"
    require-auth:
      name: "auth"
      path: "/check"
  - service: "auth"
    urls:
      - "http://localhost:9001"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.health_check.interval_secs, 5);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].service, "users");
        assert!(config.services[0].require_auth.is_some());
        assert!(config.services[1].require_auth.is_none());
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
  "listen_addr": "127.0.0.1:3000",
  "services": [
    {
      "service": "orders",
      "urls": ["http://backend:8080"]
    }
  ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].urls, vec!["http://backend:8080"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/portico.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_unparseable_file() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "services: [unterminated").unwrap();

        let result = load_config(temp_file.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
