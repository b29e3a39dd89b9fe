//! Installed plugin and theme lookup.
//!
//! The provenance extractor resolves a directory name to a display name and homepage through
//! the [`ComponentRegistry`] trait, supplied by the host when the service is built.
//!
//! - [`StaticRegistry`]: fixed entries, typically from the settings file
//! - [`FilesystemRegistry`]: reads plugin and theme headers under `wp-content`
//! - [`FallbackRegistry`]: consult one registry, then another

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An installed plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Registry key, `dir/main-file.php` (or `file.php` for single-file plugins).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Homepage.
    pub uri: Option<String>,
}

impl PluginInfo {
    /// Returns true if this plugin lives in directory `dir`.
    pub fn is_in_dir(&self, dir: &str) -> bool {
        self.key
            .split_once('/')
            .map_or(self.key == dir, |(head, _)| head == dir)
    }
}

/// An installed theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInfo {
    /// Display name.
    pub name: String,
    /// Homepage.
    pub uri: Option<String>,
}

/// Lookup of installed components by directory name.
pub trait ComponentRegistry {
    /// All installed plugins.
    fn installed_plugins(&self) -> Vec<PluginInfo>;

    /// Theme installed in `dir`, if any.
    fn lookup_theme(&self, dir: &str) -> Option<ThemeInfo>;
}

// ===== StaticRegistry =====

/// Registry with a fixed set of entries.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    plugins: Vec<PluginInfo>,
    themes: HashMap<String, ThemeInfo>,
}

impl StaticRegistry {
    /// Empty registry. Every lookup falls back to the directory name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin.
    pub fn with_plugin(mut self, key: &str, name: &str, uri: Option<&str>) -> Self {
        self.plugins.push(PluginInfo {
            key: key.to_string(),
            name: name.to_string(),
            uri: uri.map(str::to_string),
        });
        self
    }

    /// Add a theme.
    pub fn with_theme(mut self, dir: &str, name: &str, uri: Option<&str>) -> Self {
        self.themes.insert(
            dir.to_string(),
            ThemeInfo {
                name: name.to_string(),
                uri: uri.map(str::to_string),
            },
        );
        self
    }

    /// Returns true if no entries were registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty() && self.themes.is_empty()
    }
}

impl ComponentRegistry for StaticRegistry {
    fn installed_plugins(&self) -> Vec<PluginInfo> {
        self.plugins.clone()
    }

    fn lookup_theme(&self, dir: &str) -> Option<ThemeInfo> {
        self.themes.get(dir).cloned()
    }
}

// ===== FilesystemRegistry =====

/// Registry backed by plugin and theme file headers on disk.
///
/// Plugins are the `*.php` files directly inside each `plugins/<dir>/` (and single files in
/// `plugins/`) that carry a `Plugin Name:` header. Themes are `themes/<dir>/style.css` files
/// with a `Theme Name:` header.
#[derive(Debug, Clone)]
pub struct FilesystemRegistry {
    content_dir: PathBuf,
}

/// How many leading bytes of a file are searched for header fields.
const HEADER_SCAN_BYTES: usize = 8 * 1024;

impl FilesystemRegistry {
    /// Registry over `content_dir` (the `wp-content` directory).
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    fn plugin_from_file(&self, path: &Path, key: String) -> Option<PluginInfo> {
        let head = read_head(path)?;
        let name = header_field(&head, "Plugin Name")?;
        Some(PluginInfo {
            key,
            name,
            uri: header_field(&head, "Plugin URI"),
        })
    }
}

impl ComponentRegistry for FilesystemRegistry {
    fn installed_plugins(&self) -> Vec<PluginInfo> {
        let plugins_dir = self.content_dir.join("plugins");
        let Ok(dir_entries) = fs::read_dir(&plugins_dir) else {
            tracing::debug!(path = %plugins_dir.display(), "Plugins directory not readable");
            return Vec::new();
        };

        let mut plugins = Vec::new();
        for entry in dir_entries.flatten() {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                let Ok(files) = fs::read_dir(&path) else {
                    continue;
                };
                for file in files.flatten() {
                    let file_path = file.path();
                    if file_path.extension().is_some_and(|ext| ext == "php") {
                        let key =
                            format!("{}/{}", file_name, file.file_name().to_string_lossy());
                        if let Some(plugin) = self.plugin_from_file(&file_path, key) {
                            plugins.push(plugin);
                        }
                    }
                }
            } else if path.extension().is_some_and(|ext| ext == "php") {
                if let Some(plugin) = self.plugin_from_file(&path, file_name) {
                    plugins.push(plugin);
                }
            }
        }
        plugins.sort_by(|a, b| a.key.cmp(&b.key));
        plugins
    }

    fn lookup_theme(&self, dir: &str) -> Option<ThemeInfo> {
        let style = self.content_dir.join("themes").join(dir).join("style.css");
        let head = read_head(&style)?;
        Some(ThemeInfo {
            name: header_field(&head, "Theme Name")?,
            uri: header_field(&head, "Theme URI"),
        })
    }
}

fn read_head(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let end = bytes.len().min(HEADER_SCAN_BYTES);
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Value of a `Field: value` header line inside a leading comment block.
fn header_field(head: &str, field: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let line = line.trim_start_matches(|c: char| c.is_whitespace() || c == '*' || c == '#');
        let value = line.strip_prefix(field)?.trim_start().strip_prefix(':')?;
        let value = value.trim().trim_end_matches("*/").trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

// ===== FallbackRegistry =====

/// Consults `primary` first and `secondary` for anything it does not know.
pub struct FallbackRegistry {
    primary: Box<dyn ComponentRegistry>,
    secondary: Box<dyn ComponentRegistry>,
}

impl FallbackRegistry {
    /// Chain two registries.
    pub fn new(primary: Box<dyn ComponentRegistry>, secondary: Box<dyn ComponentRegistry>) -> Self {
        Self { primary, secondary }
    }
}

impl ComponentRegistry for FallbackRegistry {
    fn installed_plugins(&self) -> Vec<PluginInfo> {
        let mut plugins = self.primary.installed_plugins();
        for plugin in self.secondary.installed_plugins() {
            if !plugins.iter().any(|known| known.key == plugin.key) {
                plugins.push(plugin);
            }
        }
        plugins
    }

    fn lookup_theme(&self, dir: &str) -> Option<ThemeInfo> {
        self.primary
            .lookup_theme(dir)
            .or_else(|| self.secondary.lookup_theme(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_dir_membership() {
        let plugin = PluginInfo {
            key: "akismet/akismet.php".into(),
            name: "Akismet".into(),
            uri: None,
        };
        assert!(plugin.is_in_dir("akismet"));
        assert!(!plugin.is_in_dir("akismet-extra"));

        let single = PluginInfo {
            key: "hello.php".into(),
            name: "Hello Dolly".into(),
            uri: None,
        };
        assert!(single.is_in_dir("hello.php"));
    }

    #[test]
    fn static_registry_lookups() {
        let registry = StaticRegistry::new()
            .with_plugin("woo/woo.php", "WooCommerce", Some("https://woo.com"))
            .with_theme("astra", "Astra", None);

        assert_eq!(registry.installed_plugins().len(), 1);
        assert_eq!(registry.lookup_theme("astra").map(|t| t.name), Some("Astra".into()));
        assert!(registry.lookup_theme("missing").is_none());
    }

    #[test]
    fn header_field_parses_comment_block() {
        let head = "<?php\n/**\n * Plugin Name: My Plugin\n * Plugin URI:  https://example.com/p\n */\n";
        assert_eq!(header_field(head, "Plugin Name"), Some("My Plugin".into()));
        assert_eq!(header_field(head, "Plugin URI"), Some("https://example.com/p".into()));
        assert_eq!(header_field(head, "Author"), None);
    }

    #[test]
    fn filesystem_registry_reads_headers() {
        let root = tempfile::tempdir().unwrap();
        let plugin_dir = root.path().join("plugins").join("my-plugin");
        fs::create_dir_all(&plugin_dir).unwrap();
        fs::write(
            plugin_dir.join("my-plugin.php"),
            "<?php\n/*\nPlugin Name: My Plugin\nPlugin URI: https://example.com\n*/\n",
        )
        .unwrap();
        fs::write(plugin_dir.join("helpers.php"), "<?php // no header\n").unwrap();
        fs::write(
            root.path().join("plugins").join("hello.php"),
            "<?php\n/*\n * Plugin Name: Hello Dolly\n */\n",
        )
        .unwrap();
        let theme_dir = root.path().join("themes").join("astra");
        fs::create_dir_all(&theme_dir).unwrap();
        fs::write(theme_dir.join("style.css"), "/*\nTheme Name: Astra\nTheme URI: https://wpastra.com\n*/\n").unwrap();

        let registry = FilesystemRegistry::new(root.path());
        let plugins = registry.installed_plugins();

        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].key, "hello.php");
        assert_eq!(plugins[1].key, "my-plugin/my-plugin.php");
        assert_eq!(plugins[1].uri.as_deref(), Some("https://example.com"));

        let theme = registry.lookup_theme("astra").unwrap();
        assert_eq!(theme.name, "Astra");
        assert!(registry.lookup_theme("twentytwenty").is_none());
    }

    #[test]
    fn fallback_prefers_primary() {
        let primary = StaticRegistry::new().with_theme("astra", "Astra Pro", None);
        let secondary = StaticRegistry::new()
            .with_theme("astra", "Astra", None)
            .with_theme("kadence", "Kadence", None)
            .with_plugin("a/a.php", "A", None);
        let registry = FallbackRegistry::new(Box::new(primary), Box::new(secondary));

        assert_eq!(registry.lookup_theme("astra").unwrap().name, "Astra Pro");
        assert_eq!(registry.lookup_theme("kadence").unwrap().name, "Kadence");
        assert_eq!(registry.installed_plugins().len(), 1);
    }
}
