// ConfigService - typed access to Flagpole settings

use crate::{AdminSettings, ConfigManager, FileFormat, FlagSettings, Result, Validate};
use flagpole_log::{debug, info};
use std::path::PathBuf;

/// Environment prefix used when none is configured.
pub const DEFAULT_ENV_PREFIX: &str = "FLAGPOLE";

/// Settings service
#[derive(Clone, Default)]
pub struct ConfigService {
    manager: ConfigManager,
}

impl ConfigService {
    pub fn from_manager(manager: ConfigManager) -> Self {
        Self { manager }
    }

    pub fn builder() -> ConfigServiceBuilder {
        ConfigServiceBuilder::new()
    }

    /// The static flag table (`flags`), validated.
    pub fn flags(&self) -> Result<FlagSettings> {
        let flags = FlagSettings::from_manager(&self.manager)?;
        flags.validate()?;
        Ok(flags)
    }

    /// Admin settings (`admin`), falling back to defaults, validated.
    pub fn admin(&self) -> Result<AdminSettings> {
        let admin = AdminSettings::from_manager(&self.manager)?;
        admin.validate()?;
        Ok(admin)
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }
}

/// Builder for ConfigService. Layers are applied in this order: files,
/// `.env`, environment; later layers win.
pub struct ConfigServiceBuilder {
    prefix: String,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    config_files: Vec<(PathBuf, Option<FileFormat>)>,
}

impl ConfigServiceBuilder {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            config_files: Vec::new(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add a settings file; format is detected from the extension.
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push((path.into(), None));
        self
    }

    pub fn add_file_with_format(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.config_files.push((path.into(), Some(format)));
        self
    }

    pub fn build(self) -> Result<ConfigService> {
        let manager = ConfigManager::with_prefix(self.prefix);

        for (path, format) in self.config_files {
            let format = match format {
                Some(format) => format,
                None => FileFormat::detect(&path)?,
            };
            debug!("loading settings file"; path = path.display());
            manager.load_file(&path, format)?;
        }

        if self.load_dotenv {
            manager.load_dotenv(self.dotenv_path.as_deref())?;
        } else if self.load_env {
            manager.load_env();
        }

        info!("settings loaded"; keys = manager.keys().join(","));
        Ok(ConfigService::from_manager(manager))
    }
}

impl Default for ConfigServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
