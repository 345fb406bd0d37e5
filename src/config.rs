use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле listen обязательно".to_string(),
            ));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "поле listen должно быть корректным адресом host:port".to_string(),
            ));
        }
        if self.service.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле service не должно быть пустым".to_string(),
            ));
        }
        if self.service.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "имя юнита '{}' не должно содержать пробелов",
                self.service
            )));
        }
        if self.command_timeout_ms < 1 {
            return Err(ConfigError::Validation(
                "command_timeout_ms должно быть >= 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn default_service() -> String {
    "nginx".to_string()
}

const fn default_command_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            listen: "127.0.0.1:8080".to_string(),
            service: "nginx".to_string(),
            command_timeout_ms: 5000,
        }
    }

    #[test]
    fn valid_config_passes() {
        valid_config().validate().expect("валидная конфигурация");
    }

    #[test]
    fn minimal_yaml_gets_defaults() {
        let cfg: Config =
            serde_yaml::from_str("listen: \"0.0.0.0:8080\"").expect("разбор минимального YAML");
        cfg.validate().expect("валидация с умолчаниями");
        assert_eq!(cfg.service, "nginx");
        assert_eq!(cfg.command_timeout_ms, 5000);
    }

    #[test]
    fn rejects_empty_listen() {
        let mut cfg = valid_config();
        cfg.listen = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_listen_without_port() {
        let mut cfg = valid_config();
        cfg.listen = "127.0.0.1".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_service() {
        let mut cfg = valid_config();
        cfg.service = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_service_with_spaces() {
        let mut cfg = valid_config();
        cfg.service = "nginx extra".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = valid_config();
        cfg.command_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn example_yaml_is_valid() {
        let cfg: Config =
            serde_yaml::from_str(Config::example_yaml()).expect("разбор встроенного примера");
        cfg.validate().expect("валидация встроенного примера");
    }
}
