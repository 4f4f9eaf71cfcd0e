use std::{env, fmt, fmt::Display, path::PathBuf, str::FromStr};

use crate::errors::AppError;

/// Runtime settings, read from the environment once at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub static_dir: Option<PathBuf>,
    /// Origins allowed by CORS; `*` allows any.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("JWT_SECRET must be set".into()))?;

        Ok(Self {
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://item_announcer.db")?,
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "8080")?,
            jwt_secret,
            admin_username: try_load(&lookup, "ADMIN_USERNAME", "admin")?,
            admin_password: try_load(&lookup, "ADMIN_PASSWORD", "admin123")?,
            static_dir: lookup("STATIC_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            cors_origins: parse_origins(&try_load::<_, String>(&lookup, "CORS_ORIGINS", "*")?),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        log::debug!("{key} not set, using default: {default}");
        default.to_owned()
    });
    raw.parse()
        .map_err(|e| AppError::ConfigError(format!("invalid {key} value {raw:?}: {e}")))
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect();
    if origins.is_empty() {
        vec!["*".to_owned()]
    } else {
        origins
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("static_dir", &self.static_dir)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.database_url, "sqlite://item_announcer.db");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.admin_password, "admin123");
        assert!(config.static_dir.is_none());
        assert_eq!(config.cors_origins, vec!["*"]);
    }

    #[test]
    fn missing_or_blank_secret_is_fatal() {
        assert!(matches!(load(&[]), Err(AppError::ConfigError(_))));
        assert!(matches!(
            load(&[("JWT_SECRET", "  ")]),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = load(&[("JWT_SECRET", "x"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn overrides_are_honoured() {
        let config = load(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "3000"),
            ("STATIC_DIR", "frontend/dist"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, Some(PathBuf::from("frontend/dist")));
    }

    #[test]
    fn cors_origins_are_split_on_commas() {
        let config = load(&[
            ("JWT_SECRET", "x"),
            ("CORS_ORIGINS", " http://localhost:5173, https://shop.example.com ,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:5173", "https://shop.example.com"]
        );

        let config = load(&[("JWT_SECRET", "x"), ("CORS_ORIGINS", " , ")]).unwrap();
        assert_eq!(config.cors_origins, vec!["*"]);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&[("JWT_SECRET", "topsecret"), ("ADMIN_PASSWORD", "hunter2")]).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("topsecret"));
        assert!(!printed.contains("hunter2"));
    }
}
