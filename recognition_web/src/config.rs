use recognition_model::config::{LabelsConfig, ModelConfig, Validatable};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug`, `info` or `warn`.",
                other
            )),
        }
    }
}

/// Reads `configuration/base.yaml`, then the file named by `APP_ENVIRONMENT`
/// (`local` by default), then `APP_*` environment variables such as
/// `APP_SERVER__PORT`.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = load_configuration(&configuration_directory, &environment)?;

    if let Err(e) = validate(&config) {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(config::ConfigError::Message(e));
    }

    Ok(config)
}

/// The model file, and the labels file when one is configured, must exist.
fn validate(config: &Config) -> Result<(), String> {
    config.model.validate()?;
    if let Some(labels) = &config.labels {
        labels.validate()?;
    }
    Ok(())
}

fn load_configuration(
    configuration_directory: &Path,
    environment: &Environment,
) -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    config.try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};
    use std::path::PathBuf;

    const BASE: &str = r#"
server:
  host: "127.0.0.1"
  port: 9000
log_level: "Debug"
model:
  onnx_file: "digit_model.onnx"
  model_dir: "./models"
"#;

    fn from_yaml(sources: &[&str]) -> Result<Config, config::ConfigError> {
        sources
            .iter()
            .fold(config::Config::builder(), |builder, source| {
                builder.add_source(File::from_str(source, FileFormat::Yaml))
            })
            .build()?
            .try_deserialize::<Config>()
    }

    #[test]
    fn test_defaults_are_filled_in() {
        let config = from_yaml(&[BASE]).unwrap();

        assert_eq!(config.server.get_address(), "127.0.0.1:9000");
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.model.num_instances >= 1);
        assert_eq!(config.model.intra_threads, 1);
        assert!(config.labels.is_none());
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let overrides = r#"
server:
  port: 8080
log_level: "warn"
labels:
  labels_file: "labels.txt"
  labels_dir: "./models"
"#;
        let config = from_yaml(&[BASE, overrides]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(
            config.labels.unwrap().get_path(),
            PathBuf::from("./models/labels.txt")
        );
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let overrides = "log_level: \"trace\"\n";

        assert!(from_yaml(&[BASE, overrides]).is_err());
    }

    #[test]
    fn test_environment_parsing() {
        let local: Environment = "LOCAL".to_string().try_into().unwrap();
        assert_eq!(local.as_str(), "local");

        let staging: Result<Environment, String> = "staging".to_string().try_into();
        assert!(staging.is_err());
    }

    #[test]
    fn test_missing_labels_file_fails_validation() {
        let model_dir = std::env::temp_dir();
        let onnx_file = format!("recognition_web_config_{}.onnx", std::process::id());
        std::fs::write(model_dir.join(&onnx_file), b"").unwrap();

        let mut config = from_yaml(&[BASE]).unwrap();
        config.model.model_dir = model_dir.clone();
        config.model.onnx_file = onnx_file.clone();
        let model_only = validate(&config);

        config.labels = Some(LabelsConfig {
            labels_file: "no_such_labels.txt".to_string(),
            labels_dir: PathBuf::from("./models"),
        });
        let with_missing_labels = validate(&config);

        std::fs::remove_file(model_dir.join(&onnx_file)).unwrap();

        assert!(model_only.is_ok());
        let err = with_missing_labels.unwrap_err();
        assert!(err.contains("no_such_labels.txt"), "{}", err);
    }

    #[test]
    fn test_missing_model_file_fails_validation() {
        let config = from_yaml(&[BASE]).unwrap();

        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_configuration_directory() {
        let result = load_configuration(Path::new("./no/such/configuration"), &Environment::Local);

        assert!(result.is_err());
    }
}
