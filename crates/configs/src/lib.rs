//! # configs
//!
//! Layered settings for the admin client. Later layers win:
//!
//! 1. built-in defaults
//! 2. `{dir}/default.{toml,yaml,json}` (optional)
//! 3. `{dir}/local.{toml,yaml,json}` (optional)
//! 4. `CMS__SECTION__KEY` environment variables, after `.env` is loaded

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CMS";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub backend: BackendSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    #[serde(deserialize_with = "secret")]
    pub anon_key: SecretString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Where the signed-in session is kept between runs.
    pub file: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".cms-admin/session.json"),
        }
    }
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads `.env`, then every layer under `dir`, then validates.
    pub fn load(dir: &Path) -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::build(dir, None)
    }

    /// Same as [`Settings::load`] without `.env`; `env` replaces the process
    /// environment when given.
    pub fn build(dir: &Path, env: Option<HashMap<String, String>>) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = self.backend.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::Invalid {
                key: "backend.url",
                reason: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        if self.backend.anon_key.expose_secret().trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "backend.anon_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn environment_alone_is_enough() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::build(
            dir.path(),
            env(&[
                ("CMS__BACKEND__URL", "https://demo.supabase.co"),
                ("CMS__BACKEND__ANON_KEY", "anon"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.backend.url, "https://demo.supabase.co");
        assert_eq!(settings.backend.anon_key.expose_secret(), "anon");
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert_eq!(settings.session.file, PathBuf::from(".cms-admin/session.json"));
    }

    #[test]
    fn local_file_overrides_default_and_env_overrides_both() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[backend]\nurl = \"https://default.example\"\nanon_key = \"k\"\n[log]\nformat = \"json\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("local.toml"),
            "[backend]\nurl = \"https://local.example\"\n",
        )
        .unwrap();

        let settings = Settings::build(dir.path(), env(&[])).unwrap();
        assert_eq!(settings.backend.url, "https://local.example");
        assert_eq!(settings.log.format, LogFormat::Json);

        let settings =
            Settings::build(dir.path(), env(&[("CMS__LOG__LEVEL", "debug")])).unwrap();
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn validation_rejects_bad_backend() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::build(
            dir.path(),
            env(&[
                ("CMS__BACKEND__URL", "demo.supabase.co"),
                ("CMS__BACKEND__ANON_KEY", "anon"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "backend.url", .. }));

        let err = Settings::build(
            dir.path(),
            env(&[
                ("CMS__BACKEND__URL", "https://demo.supabase.co"),
                ("CMS__BACKEND__ANON_KEY", " "),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "backend.anon_key", .. }));
    }

    #[test]
    fn missing_backend_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::build(dir.path(), env(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }
}
