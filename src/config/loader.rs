//! Settings file loading with precedence handling.

use crate::model::{CategoryRule, ErrorCategory};
use crate::parser::segment::DEFAULT_MAX_ENTRIES;
use crate::registry::StaticRegistry;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML settings file structure.
///
/// All fields are optional; hardcoded defaults fill the gaps.
/// Corresponds to `~/.config/dlm/config.toml`:
///
/// ```toml
/// app_root = "/var/www/html"
/// max_entries = 50000
///
/// [[plugins]]
/// key = "woocommerce/woocommerce.php"
/// name = "WooCommerce"
/// uri = "https://woocommerce.com/"
///
/// [[categories]]
/// label = "PHP Strict"
/// matches = ["PHP Strict Standards"]
/// strip = ["PHP Strict Standards: "]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Application install root, as it appears in log messages.
    #[serde(default)]
    pub app_root: Option<PathBuf>,

    /// Explicit `wp-config.php` location. Located from `app_root` when absent.
    #[serde(default)]
    pub wp_config_path: Option<PathBuf>,

    /// Managed debug log file.
    #[serde(default)]
    pub debug_log_path: Option<PathBuf>,

    /// Content directory (`wp-content`).
    #[serde(default)]
    pub content_dir: Option<PathBuf>,

    /// Retention bound on parsed fragments.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Recognize timestamps in zones other than UTC.
    #[serde(default)]
    pub process_non_utc_timezones: Option<bool>,

    /// Toggle `SCRIPT_DEBUG` along with debug logging.
    #[serde(default)]
    pub modify_script_debug: Option<bool>,

    /// Running core version, for source-browser links.
    #[serde(default)]
    pub app_version: Option<String>,

    /// Public site URL, used in JavaScript error lines.
    #[serde(default)]
    pub site_url: Option<String>,

    /// Admin base URL, for file-editor links.
    #[serde(default)]
    pub admin_url: Option<String>,

    /// Record browser-side JavaScript errors.
    #[serde(default)]
    pub js_error_logging: Option<bool>,

    /// Suppress file-editor links.
    #[serde(default)]
    pub file_edit_disallowed: Option<bool>,

    /// Minutes added to UTC log timestamps for display.
    #[serde(default)]
    pub display_utc_offset_minutes: Option<i32>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Installed plugins.
    #[serde(default)]
    pub plugins: Vec<PluginSection>,

    /// Installed themes.
    #[serde(default)]
    pub themes: Vec<ThemeSection>,

    /// Extra categories, consulted after the built-in ones.
    #[serde(default)]
    pub categories: Vec<CategorySection>,
}

/// `[[plugins]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PluginSection {
    /// Registry key, `dir/main-file.php`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Homepage.
    #[serde(default)]
    pub uri: Option<String>,
}

/// `[[themes]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThemeSection {
    /// Theme directory name.
    pub dir: String,
    /// Display name.
    pub name: String,
    /// Homepage.
    #[serde(default)]
    pub uri: Option<String>,
}

/// `[[categories]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CategorySection {
    /// Display label, also the filter value.
    pub label: String,
    /// Substrings that select the category.
    pub matches: Vec<String>,
    /// Prefix phrases removed on match.
    #[serde(default)]
    pub strip: Vec<String>,
}

impl From<CategorySection> for CategoryRule {
    fn from(section: CategorySection) -> Self {
        CategoryRule {
            category: ErrorCategory::from_label(&section.label),
            needles: section.matches,
            strip: section.strip,
        }
    }
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Application install root.
    pub app_root: PathBuf,
    /// Explicit `wp-config.php` location.
    pub wp_config_path: Option<PathBuf>,
    /// Managed debug log file.
    pub debug_log_path: PathBuf,
    /// Content directory.
    pub content_dir: PathBuf,
    /// Retention bound on parsed fragments.
    pub max_entries: usize,
    /// Recognize non-UTC timestamps.
    pub process_non_utc_timezones: bool,
    /// Toggle `SCRIPT_DEBUG` along with debug logging.
    pub modify_script_debug: bool,
    /// Running core version.
    pub app_version: String,
    /// Public site URL.
    pub site_url: String,
    /// Admin base URL.
    pub admin_url: String,
    /// Record browser-side JavaScript errors.
    pub js_error_logging: bool,
    /// Suppress file-editor links. `None` defers to `DISALLOW_FILE_EDIT`.
    pub file_edit_disallowed: Option<bool>,
    /// Display offset in minutes.
    pub display_utc_offset_minutes: i32,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Registry entries from the settings file.
    pub plugins: Vec<PluginSection>,
    /// Registry entries from the settings file.
    pub themes: Vec<ThemeSection>,
    /// Extra categories.
    pub categories: Vec<CategorySection>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::for_root(PathBuf::from("."))
    }
}

impl ResolvedConfig {
    /// Defaults for an install at `app_root`; dependent paths are derived from it.
    ///
    /// A relative root is resolved against the working directory.
    pub fn for_root(app_root: PathBuf) -> Self {
        let app_root = absolute(app_root);
        let content_dir = app_root.join("wp-content");
        Self {
            debug_log_path: default_debug_log_path(&content_dir),
            content_dir,
            app_root,
            wp_config_path: None,
            max_entries: DEFAULT_MAX_ENTRIES,
            process_non_utc_timezones: true,
            modify_script_debug: true,
            app_version: "6.4".to_string(),
            site_url: "http://localhost".to_string(),
            admin_url: "/wp-admin/".to_string(),
            js_error_logging: true,
            file_edit_disallowed: None,
            display_utc_offset_minutes: 0,
            log_file_path: default_log_path(),
            plugins: Vec::new(),
            themes: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Move the install root. Paths still at their derived defaults follow it.
    pub fn set_app_root(&mut self, root: PathBuf) {
        let derived_content = self.content_dir == self.app_root.join("wp-content");
        let derived_log = self.debug_log_path == default_debug_log_path(&self.content_dir);
        self.app_root = absolute(root);
        if derived_content {
            self.content_dir = self.app_root.join("wp-content");
        }
        if derived_log {
            self.debug_log_path = default_debug_log_path(&self.content_dir);
        }
    }

    /// Registry built from the `[[plugins]]` and `[[themes]]` tables.
    pub fn static_registry(&self) -> StaticRegistry {
        let registry = self.plugins.iter().fold(StaticRegistry::new(), |reg, p| {
            reg.with_plugin(&p.key, &p.name, p.uri.as_deref())
        });
        self.themes.iter().fold(registry, |reg, t| {
            reg.with_theme(&t.dir, &t.name, t.uri.as_deref())
        })
    }

    /// Category rules contributed by the settings file.
    pub fn category_rules(&self) -> Vec<CategoryRule> {
        self.categories.iter().cloned().map(CategoryRule::from).collect()
    }
}

/// Managed log location under the content directory.
pub fn default_debug_log_path(content_dir: &std::path::Path) -> PathBuf {
    content_dir
        .join("uploads")
        .join("debug-log-manager")
        .join("debug.log")
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/dlm/dlm.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("dlm").join("dlm.log")
    } else {
        PathBuf::from("dlm.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/dlm/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dlm").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `DLM_CONFIG` environment variable
/// 3. Default path `~/.config/dlm/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("DLM_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Resolve `path` against the working directory.
///
/// The runtime resolves a relative `WP_DEBUG_LOG` per request, so every install path is kept
/// absolute. Falls back to the path as given when the working directory is unavailable.
fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `DLM_APP_ROOT`: install root
/// - `DLM_DEBUG_LOG`: managed debug log file
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(root) = std::env::var("DLM_APP_ROOT") {
        config.set_app_root(PathBuf::from(root));
    }

    if let Ok(log) = std::env::var("DLM_DEBUG_LOG") {
        config.debug_log_path = absolute(PathBuf::from(log));
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// `content_dir` and `debug_log_path` default relative to the file's `app_root`.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let Some(config) = config_file else {
        return ResolvedConfig::default();
    };

    let defaults = match config.app_root {
        Some(root) => ResolvedConfig::for_root(root),
        None => ResolvedConfig::default(),
    };
    let content_dir = config.content_dir.map_or(defaults.content_dir, absolute);
    let debug_log_path = config
        .debug_log_path
        .map_or_else(|| default_debug_log_path(&content_dir), absolute);

    ResolvedConfig {
        app_root: defaults.app_root,
        wp_config_path: config.wp_config_path,
        debug_log_path,
        content_dir,
        max_entries: config.max_entries.unwrap_or(defaults.max_entries),
        process_non_utc_timezones: config
            .process_non_utc_timezones
            .unwrap_or(defaults.process_non_utc_timezones),
        modify_script_debug: config
            .modify_script_debug
            .unwrap_or(defaults.modify_script_debug),
        app_version: config.app_version.unwrap_or(defaults.app_version),
        site_url: config.site_url.unwrap_or(defaults.site_url),
        admin_url: config.admin_url.unwrap_or(defaults.admin_url),
        js_error_logging: config.js_error_logging.unwrap_or(defaults.js_error_logging),
        file_edit_disallowed: config.file_edit_disallowed,
        display_utc_offset_minutes: config
            .display_utc_offset_minutes
            .unwrap_or(defaults.display_utc_offset_minutes),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        plugins: config.plugins,
        themes: config.themes,
        categories: config.categories,
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only flags the user actually passed are applied.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    root_override: Option<PathBuf>,
    debug_log_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(root) = root_override {
        config.set_app_root(root);
    }

    if let Some(log) = debug_log_override {
        config.debug_log_path = absolute(log);
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
