use log::LevelFilter;
use std::{collections::HashMap, fs, io};
use toml;

pub fn load() -> crate::Result<Config> {
    let data = match fs::read("config.toml") {
        Ok(data) => data,
        Err(ref err) if err.kind() == io::ErrorKind::NotFound =>
            return Ok(Config::default()),
        Err(err) => return Err(ReadConfigurationError(err).into()),
    };

    toml::from_slice(&data).map_err(|e| ConfigurationError(e).into())
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub database: Option<Database>,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub moderation: Moderation,
}

impl Config {
    /// Validate configuration correctness.
    pub fn validate(&self) -> Result<(), failure::Error> {
        if self.moderation.stale_draft_days == 0 {
            bail!("moderation.stale_draft_days must be at least one day");
        }

        Ok(())
    }
}

/// Database configuration. The `DATABASE_URL` environment variable takes
/// precedence over this section.
#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Logging {
    /// Default logging level.
    #[serde(default = "default_level_filter")]
    pub level: LevelFilter,
    /// Custom filters.
    #[serde(default)]
    pub filters: HashMap<String, LevelFilter>,
}

/// Moderation and content-retention configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Moderation {
    /// Age, in days, after which a never-submitted draft is considered stale
    /// and eligible for administrative cleanup.
    #[serde(default = "default_stale_draft_days")]
    pub stale_draft_days: u32,
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot read configuration file")]
pub struct ReadConfigurationError(#[fail(cause)] std::io::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: {}", _0)]
pub struct ConfigurationError(#[fail(cause)] toml::de::Error);

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

fn default_stale_draft_days() -> u32 {
    30
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_level_filter(),
            filters: HashMap::new(),
        }
    }
}

impl Default for Moderation {
    fn default() -> Self {
        Moderation {
            stale_draft_days: default_stale_draft_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::Config;

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(r#"
            [database]
            url = "postgres://localhost/archivar"

            [logging]
            level = "debug"
            filters = { "archivar::events" = "trace" }

            [moderation]
            stale_draft_days = 14
        "#).unwrap();

        assert_eq!(config.database.unwrap().url, "postgres://localhost/archivar");
        assert_eq!(config.logging.level, LevelFilter::Debug);
        assert_eq!(config.logging.filters["archivar::events"], LevelFilter::Trace);
        assert_eq!(config.moderation.stale_draft_days, 14);
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.logging.level, LevelFilter::Info);
        assert_eq!(config.moderation.stale_draft_days, 30);
        config.validate().unwrap();
    }
}
