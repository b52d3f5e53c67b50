use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub first_superuser_email: Option<String>,

    #[serde(default)]
    pub first_superuser_password: Option<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    bind_address: Option<String>,
    log_dir: Option<String>,
    max_connections: Option<u32>,
    bcrypt_cost: Option<u32>,
    first_superuser_email: Option<String>,
    first_superuser_password: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl ServerConfig {
    /// Defaults, then the optional TOML file, then environment variables.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config: PartialServerConfig = match config_path.map(Path::new) {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialServerConfig::default(),
        };

        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::merge(file_config, env_config)
    }

    fn merge(file_config: PartialServerConfig, env_config: PartialServerConfig) -> Result<Self, String> {
        Ok(ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            bind_address: env_config
                .bind_address
                .or(file_config.bind_address)
                .unwrap_or_else(default_bind_address),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            max_connections: env_config
                .max_connections
                .or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
            bcrypt_cost: env_config
                .bcrypt_cost
                .or(file_config.bcrypt_cost)
                .unwrap_or_else(default_bcrypt_cost),
            first_superuser_email: env_config
                .first_superuser_email
                .or(file_config.first_superuser_email),
            first_superuser_password: env_config
                .first_superuser_password
                .or(file_config.first_superuser_password),
        })
    }

    /// Both bootstrap credentials, when both are configured.
    pub fn first_superuser(&self) -> Option<(&str, &str)> {
        match (&self.first_superuser_email, &self.first_superuser_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_layer() -> PartialServerConfig {
        toml::from_str(
            r#"
            database_url = "postgres://file/db"
            jwt_secret = "file-secret"
            bind_address = "127.0.0.1:9000"
            first_superuser_email = "root@example.com"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_environment_overrides_file() {
        let env_layer = PartialServerConfig {
            jwt_secret: Some("env-secret".to_string()),
            first_superuser_password: Some("changethis".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(file_layer(), env_layer).unwrap();

        assert_eq!(config.database_url, "postgres://file/db");
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.first_superuser(), Some(("root@example.com", "changethis")));
    }

    #[test]
    fn test_missing_required_fields() {
        let err = ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default())
            .unwrap_err();
        assert_eq!(err, "DATABASE_URL is required");
    }

    #[test]
    fn test_bootstrap_needs_both_credentials() {
        let config = ServerConfig::merge(file_layer(), PartialServerConfig::default()).unwrap();
        assert_eq!(config.first_superuser(), None);
    }
}
