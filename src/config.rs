//! Application configuration module
//!
//! This module centralizes all application configuration settings using `confy`
//! for automatic serialization and OS-specific config directory management.

use crate::analyzer::FileAnalyzer;
use crate::constant::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, DEFAULT_TAB_WIDTH};
use crate::diff::{CommentOnlyPolicy, DiffAlgorithm};
use crate::filter::builtin::builtin_filters;
use crate::filter::{ConfigurableLanguageFilter, FilterError, LanguageDefinition, LanguageFilter};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Confy(#[from] confy::ConfyError),

    #[error("Language {id}: {source}")]
    Filter {
        id: String,
        #[source]
        source: FilterError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
}

impl Config {
    /// Load configuration from disk, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = confy::load(APP_NAME, None)?;
        info!("Load config from {:?}", Self::config_path()?);
        Ok(Self { settings })
    }

    /// Save current configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, &self.settings)?;
        info!("Save config to {:?}", Self::config_path()?);
        Ok(())
    }

    /// Get the version store directory.
    /// Falls back to a local "data" directory if platform dirs are unavailable
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.settings.store_dir {
            return dir.clone();
        }
        if let Some(proj_dirs) = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME) {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from("data")
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    /// User-defined languages followed by the built-in ones
    pub fn filters(&self) -> Result<Vec<Arc<dyn LanguageFilter>>, ConfigError> {
        let mut filters: Vec<Arc<dyn LanguageFilter>> = Vec::new();
        for definition in &self.settings.languages {
            let filter = ConfigurableLanguageFilter::new(definition).map_err(|source| {
                ConfigError::Filter {
                    id: definition.id.clone(),
                    source,
                }
            })?;
            filters.push(Arc::new(filter.user_defined()));
        }
        filters.extend(builtin_filters());
        Ok(filters)
    }

    /// An analyzer set up from these settings
    pub fn analyzer(&self) -> Result<FileAnalyzer, ConfigError> {
        Ok(FileAnalyzer::new(self.filters()?)
            .with_algorithm(self.settings.diff_algorithm)
            .with_policy(self.settings.comment_only_policy)
            .with_tab_width(self.settings.tab_width)
            .with_options(&self.settings.default_options))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Line diff algorithm used for every comparison
    #[serde(default)]
    pub diff_algorithm: DiffAlgorithm,

    /// Tab width for rendered redlines
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,

    /// Classification of files whose only changes are comments or blank lines
    #[serde(default)]
    pub comment_only_policy: CommentOnlyPolicy,

    /// Option string applied to every analysis, e.g. `-countBraces`
    #[serde(default)]
    pub default_options: String,

    /// Extra language definitions, preferred over built-ins
    #[serde(default)]
    pub languages: Vec<LanguageDefinition>,

    /// Where the version store lives; platform data dir when unset
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

fn default_tab_width() -> usize {
    DEFAULT_TAB_WIDTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            diff_algorithm: DiffAlgorithm::default(),
            tab_width: DEFAULT_TAB_WIDTH,
            comment_only_policy: CommentOnlyPolicy::default(),
            default_options: String::new(),
            languages: Vec::new(),
            store_dir: None,
        }
    }
}
