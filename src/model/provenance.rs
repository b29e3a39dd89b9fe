//! Source-code provenance attached to a classified log entry.

use serde::Serialize;

/// Which part of the installation a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `/wp-admin/` or `/wp-includes/`.
    Core,
    /// A directory under the themes root.
    Theme,
    /// A directory under the plugins root.
    Plugin,
}

impl SourceKind {
    /// Lowercase display name.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Core => "core",
            SourceKind::Theme => "theme",
            SourceKind::Plugin => "plugin",
        }
    }
}

/// How the file location was written in the message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStyle {
    /// `in /path/file.php:12`, as written before a stack trace.
    Colon,
    /// `in /path/file.php on line 12`.
    #[default]
    OnLine,
}

/// File/line provenance detected in a message.
///
/// Every field is optional: heuristics that fail to split the message leave fields empty
/// rather than erroring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Owning component, if the short path identifies one.
    pub source: Option<SourceKind>,
    /// Path relative to the application root, always starting with `/`.
    pub file_path: Option<String>,
    /// Line number as it appeared in the message.
    pub file_line: Option<String>,
    /// Human-readable theme/plugin name.
    pub name: Option<String>,
    /// Theme/plugin homepage.
    pub uri: Option<String>,
    /// Directory name of the owning theme/plugin.
    pub slug: Option<String>,
    /// Plugin registry key (`dir/main.php`) when the plugin was found in the registry.
    pub plugin_key: Option<String>,
    /// Message text before the `in /path` clause.
    pub description: String,
    /// Message text after the line number (stack trace and `thrown in` tail included).
    pub trailer: String,
    /// Separator used between path and line.
    pub style: LocationStyle,
}

impl Provenance {
    /// Path of the file relative to its theme/plugin directory.
    ///
    /// `/wp-content/plugins/my-plugin/inc/a.php` yields `inc/a.php`.
    pub fn component_relative_path(&self) -> Option<&str> {
        let path = self.file_path.as_deref()?;
        let slug = self.slug.as_deref()?;
        let marker = format!("/{slug}/");
        path.find(&marker).map(|idx| &path[idx + marker.len()..])
    }
}
