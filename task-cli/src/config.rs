use serde::Deserialize;
use std::path::PathBuf;

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".task-cli";
/// Prefix of the environment variables that override the file, e.g. `TASK_CLI_STORE_PATH`.
pub const ENV_PREFIX: &str = "TASK_CLI";

const TASK_FILE: &str = "tasks.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Loads `.task-cli.{toml,yaml,json,...}` if present, then applies `TASK_CLI_*` variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name(CONFIG_FILE).required(false))
                .add_source(config::Environment::with_prefix(ENV_PREFIX)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// The configured log level, or `WARN` when it cannot be parsed.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::WARN)
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(TASK_FILE)
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Config, config::ConfigError> {
        Config::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).source(Some(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = Config::from_builder(config::Config::builder()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.store_path, PathBuf::from("tasks.json"));
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    mod deser_tests {
        use super::*;

        #[test]
        fn test_config_deserialize_from_toml() {
            // Arrange
            let toml_str = r#"
                store_path = "/tmp/my-tasks.json"
                log_level = "debug"
            "#;

            // Act
            let config = from_toml(toml_str).unwrap();

            // Assert
            assert_eq!(config.store_path, PathBuf::from("/tmp/my-tasks.json"));
            assert_eq!(config.log_level(), tracing::Level::DEBUG);
        }

        #[test]
        fn test_config_partial_toml_keeps_defaults() {
            let config = from_toml(r#"log_level = "info""#).unwrap();

            assert_eq!(config.store_path, PathBuf::from("tasks.json"));
            assert_eq!(config.log_level(), tracing::Level::INFO);
        }

        #[test]
        fn test_config_unknown_log_level_falls_back_to_warn() {
            let config = from_toml(r#"log_level = "chatty""#).unwrap();

            assert_eq!(config.log_level(), tracing::Level::WARN);
        }
    }

    #[test]
    fn environment_overrides_file() {
        // Arrange
        let builder = config::Config::builder()
            .add_source(config::File::from_str(
                r#"store_path = "from-file.json""#,
                config::FileFormat::Toml,
            ))
            .add_source(env(&[("TASK_CLI_STORE_PATH", "from-env.json")]));

        // Act
        let config = Config::from_builder(builder).unwrap();

        // Assert
        assert_eq!(config.store_path, PathBuf::from("from-env.json"));
    }

    #[test]
    fn unrelated_environment_is_ignored() {
        let builder = config::Config::builder().add_source(env(&[("PATH", "/usr/bin")]));

        let config = Config::from_builder(builder).unwrap();

        assert_eq!(config, Config::default());
    }
}
