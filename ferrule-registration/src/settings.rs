use std::path::Path;

use config::{ConfigError, File, ValueKind};
use serde::{Deserialize, Serialize};

use crate::{
    lifetime::Lifetime,
    log::Level,
    trace::{SharedTraceSink, TracingSink},
};

/// Settings loaded from `config.toml` and the environment.
///
/// # Example
/// ```no_run
/// use ferrule_registration::settings::{RegistrationSettings, Settings};
/// use std::path::Path;
///
/// let settings = Settings::load(Path::new("etc"), Some("FERRULE"), "__").unwrap();
/// let registration: RegistrationSettings = settings.get().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    inner: config::Config,
}

impl Settings {
    pub fn new(inner: config::Config) -> Self {
        Self { inner }
    }

    pub fn load(
        folder: &Path,
        env_config_prefix: Option<&str>,
        env_config_split: &str,
    ) -> Result<Self, ConfigError> {
        let cfg = folder.join("config.toml");
        let mut builder = config::Config::builder();

        if cfg.exists() {
            builder = builder.add_source(File::from(cfg))
        } else {
            tracing::warn!("not found config `{}`", cfg.display());
        }
        // add environment variables to config
        if let Some(prefix) = env_config_prefix {
            builder = builder
                .add_source(config::Environment::with_prefix(prefix).separator(env_config_split));
        }
        let config = builder.build()?;

        Ok(Self { inner: config })
    }

    /// Reads the section named by `T::PREFIX`. A missing section yields
    /// `T`'s defaults when `T` can be built from an empty table.
    pub fn get<'de, T>(&self) -> Result<T, ConfigError>
    where
        T: ConfigPrefix + Deserialize<'de>,
    {
        match self.inner.get::<T>(T::PREFIX) {
            Ok(o) => Ok(o),
            Err(e) => {
                let ConfigError::NotFound(_) = &e else {
                    return Err(e);
                };
                let v = config::Value::new(None, ValueKind::Table(Default::default()));

                match T::deserialize(v) {
                    Ok(o) => Ok(o),
                    Err(_) => Err(e),
                }
            }
        }
    }
}

pub trait ConfigPrefix {
    const PREFIX: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationSettings {
    default_lifetime: Lifetime,
    trace_level: Level,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            default_lifetime: Lifetime::PerRequest,
            trace_level: Level::Debug,
        }
    }
}

impl RegistrationSettings {
    pub fn new(default_lifetime: Lifetime, trace_level: Level) -> Self {
        Self {
            default_lifetime,
            trace_level,
        }
    }

    pub fn default_lifetime(&self) -> Lifetime {
        self.default_lifetime
    }

    pub fn trace_level(&self) -> Level {
        self.trace_level
    }

    pub fn trace_sink(&self) -> SharedTraceSink {
        TracingSink::shared(self.trace_level)
    }
}

impl ConfigPrefix for RegistrationSettings {
    const PREFIX: &'static str = "registration";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LoggingSettings;
    use std::fs;

    fn write_config(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), contents).unwrap();
        dir
    }

    #[test]
    fn reads_registration_section() {
        let dir = write_config(
            r#"
            [registration]
            default_lifetime = "singleton"
            trace_level = "info"
            "#,
        );
        let settings = Settings::load(dir.path(), None, "__").unwrap();
        let registration: RegistrationSettings = settings.get().unwrap();
        assert_eq!(registration.default_lifetime(), Lifetime::Singleton);
        assert_eq!(registration.trace_level(), Level::Info);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = write_config("");
        let settings = Settings::load(dir.path(), None, "__").unwrap();
        let registration: RegistrationSettings = settings.get().unwrap();
        assert_eq!(registration, RegistrationSettings::default());
        let logging: LoggingSettings = settings.get().unwrap();
        assert_eq!(logging.level(), Level::Info);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, "__").unwrap();
        let registration: RegistrationSettings = settings.get().unwrap();
        assert_eq!(registration.default_lifetime(), Lifetime::PerRequest);
    }

    #[test]
    fn unknown_lifetime_is_rejected() {
        let dir = write_config(
            r#"
            [registration]
            default_lifetime = "forever"
            "#,
        );
        let settings = Settings::load(dir.path(), None, "__").unwrap();
        assert!(settings.get::<RegistrationSettings>().is_err());
    }
}
