use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// The bot's own member id. Member-added events for this id are ignored.
    pub bot_id: String,
    pub log_level: Level,
    /// Optional JSON catalog replacing the built-in topic tree.
    pub topics_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let bot_id = std::env::var("BOT_ID").unwrap_or_else(|_| "techbot".to_string());
        if bot_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "BOT_ID".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let topics_path = std::env::var("TOPICS_PATH").ok().map(PathBuf::from);
        if let Some(path) = &topics_path {
            if !path.is_file() {
                return Err(ConfigError::InvalidValue(
                    "TOPICS_PATH".to_string(),
                    format!("'{}' is not a file", path.display()),
                ));
            }
        }

        Ok(Self {
            bind_address,
            bot_id,
            log_level,
            topics_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("BOT_ID");
            env::remove_var("RUST_LOG");
            env::remove_var("TOPICS_PATH");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.bot_id, "techbot");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.topics_path, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        let catalog = tempfile::NamedTempFile::new().unwrap();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("BOT_ID", "menu-bot");
            env::set_var("RUST_LOG", "debug");
            env::set_var("TOPICS_PATH", catalog.path());
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.bot_id, "menu-bot");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.topics_path.as_deref(), Some(catalog.path()));
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_empty_bot_id() {
        clear_env_vars();
        unsafe {
            env::set_var("BOT_ID", "  ");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BOT_ID"),
            _ => panic!("Expected InvalidValue for BOT_ID"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_missing_topics_file() {
        clear_env_vars();
        unsafe {
            env::set_var("TOPICS_PATH", "/definitely/not/here.json");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, value) => {
                assert_eq!(var, "TOPICS_PATH");
                assert!(value.contains("/definitely/not/here.json"));
            }
            _ => panic!("Expected InvalidValue for TOPICS_PATH"),
        }
        clear_env_vars();
    }
}
