//! Configuration management for the wiki renderer.
//!
//! Parses `wiki.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! URL values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `links.base_url`
//! - every `links.interwiki` template

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wiki.toml";

/// Placeholder replaced by the page name in interwiki URL templates.
pub const INTERWIKI_PLACEHOLDER: &str = "%s";

/// Upper bound for `render.max_macro_depth`.
const MAX_MACRO_DEPTH: usize = 100;

/// Upper bound for `docbook.indent`.
const MAX_INDENT: usize = 8;

/// Renderer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shared rendering options.
    pub render: RenderConfig,
    /// Link resolution options.
    pub links: LinksConfig,
    /// Docbook output options.
    pub docbook: DocbookConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Options shared by every output format.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// CSS marker class attached to every structural HTML element.
    pub css_class: String,
    /// Maximum nesting of macro expansions before invocations are left as literals.
    pub max_macro_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            css_class: "wiki-content".to_owned(),
            max_macro_depth: 10,
        }
    }
}

/// Link resolution configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// URL prefix for pages of the local wiki.
    pub base_url: String,
    /// Name under which the local wiki may be addressed explicitly (`main:Page`).
    pub local_wiki: Option<String>,
    /// Known foreign wikis: name to URL template containing `%s`.
    pub interwiki: BTreeMap<String, String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            base_url: "/pages".to_owned(),
            local_wiki: None,
            interwiki: BTreeMap::new(),
        }
    }
}

/// Docbook output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocbookConfig {
    /// Indentation width of the serialized document.
    pub indent: usize,
    /// Value of the `xml:lang` attribute on the article element.
    pub lang: String,
}

impl Default for DocbookConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            lang: "en".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`links.base_url`").
        field: String,
        /// Error message (e.g., "${`WIKI_BASE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wiki.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => {
                tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from TOML text.
    ///
    /// Applies environment expansion and validation, like [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        self.validate_links()?;
        self.validate_docbook()?;
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.render.css_class, "render.css_class")?;

        let depth = self.render.max_macro_depth;
        if depth == 0 || depth > MAX_MACRO_DEPTH {
            return Err(ConfigError::Validation(format!(
                "render.max_macro_depth must be between 1 and {MAX_MACRO_DEPTH}"
            )));
        }
        Ok(())
    }

    fn validate_links(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.links.base_url, "links.base_url")?;

        if let Some(ref local) = self.links.local_wiki {
            require_non_empty(local, "links.local_wiki")?;
        }

        for (name, template) in &self.links.interwiki {
            let field = format!("links.interwiki.{name}");
            require_http_url(template, &field)?;
            if !template.contains(INTERWIKI_PLACEHOLDER) {
                return Err(ConfigError::Validation(format!(
                    "{field} must contain {INTERWIKI_PLACEHOLDER}"
                )));
            }
        }
        Ok(())
    }

    fn validate_docbook(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.docbook.lang, "docbook.lang")?;
        if self.docbook.indent > MAX_INDENT {
            return Err(ConfigError::Validation(format!(
                "docbook.indent cannot exceed {MAX_INDENT}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in URL fields.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.links.base_url = expand::expand_env(&self.links.base_url, "links.base_url")?;

        for (name, template) in &mut self.links.interwiki {
            *template = expand::expand_env(template, &format!("links.interwiki.{name}"))?;
        }

        Ok(())
    }
}
