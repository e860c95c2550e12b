use std::{env, path::PathBuf};

use crate::{Result, ServerErr};

pub const HOST_VAR: &str = "HOST";
pub const PORT_VAR: &str = "PORT";
pub const MODEL_PATH_VAR: &str = "MODEL_PATH";

/// Where to listen and which model to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from("models/svc.json"),
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `MODEL_PATH`, unset variables keep their default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    /// Returns `ServerErr::Config` if the port is not a valid `u16`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR) {
            config.host = host;
        }

        if let Some(port) = lookup(PORT_VAR) {
            config.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| ServerErr::Config(format!("{PORT_VAR}='{port}': {e}")))?;
        }

        if let Some(path) = lookup(MODEL_PATH_VAR) {
            config.model_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_keep_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn variables_override_defaults() {
        let config = ServerConfig::from_lookup(|key| match key {
            PORT_VAR => Some("8080".to_string()),
            MODEL_PATH_VAR => Some("/srv/model.json".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let result = ServerConfig::from_lookup(|key| (key == PORT_VAR).then(|| "70000".to_string()));
        assert!(matches!(result, Err(ServerErr::Config(_))));
    }
}
