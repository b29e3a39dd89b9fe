//! File/line provenance extraction.
//!
//! Messages like `Undefined array key "foo" in /var/www/html/wp-content/plugins/x/a.php on
//! line 42` embed the file that raised them. This module isolates that clause with ordered
//! string splits, shortens the path relative to the application root and works out which
//! core/theme/plugin component owns it. A split that finds nothing leaves the entry
//! unannotated; it never errors.

use crate::model::{LocationStyle, Provenance, SourceKind};
use crate::parser::segment::{SECTION_BREAK, STACK_TRACE_MARKER};
use crate::registry::{ComponentRegistry, PluginInfo};
use std::cell::OnceCell;

const PATH_CLAUSE: &str = " in /";
const LINE_CLAUSE: &str = " on line ";

const CORE_DIRS: [&str; 2] = ["/wp-admin/", "/wp-includes/"];
const THEME_DIRS: [&str; 1] = ["/wp-content/themes/"];
const PLUGIN_DIRS: [&str; 2] = ["/wp-content/plugins/", "/wp-content/mu-plugins/"];

/// Extracts provenance for one pipeline run.
///
/// The plugin list is fetched from the registry at most once per extractor.
pub struct ProvenanceExtractor<'a> {
    app_root: String,
    registry: &'a dyn ComponentRegistry,
    plugins: OnceCell<Vec<PluginInfo>>,
}

impl<'a> ProvenanceExtractor<'a> {
    /// Create an extractor. Trailing slashes on `app_root` are ignored.
    pub fn new(app_root: &str, registry: &'a dyn ComponentRegistry) -> Self {
        Self {
            app_root: app_root.trim_end_matches('/').to_string(),
            registry,
            plugins: OnceCell::new(),
        }
    }

    /// Extract provenance from classified details.
    ///
    /// Returns `None` unless the message mentions the application root and contains an
    /// `in /<path>` clause.
    pub fn extract(&self, message: &str) -> Option<Provenance> {
        if self.app_root.is_empty() || !message.contains(&self.app_root) {
            return None;
        }

        let stack_start = message.find(STACK_TRACE_MARKER);
        let head = &message[..stack_start.unwrap_or(message.len())];
        let clause_start = head.rfind(PATH_CLAUSE)?;
        let path_start = clause_start + PATH_CLAUSE.len() - 1;
        let clause = &head[path_start..];

        let style = if stack_start.is_some() {
            LocationStyle::Colon
        } else {
            LocationStyle::OnLine
        };
        let location = split_location(clause, style);
        let trailer_start = path_start + location.consumed;

        let short_path = self.shorten(location.path);
        let (source, slug) = classify_path(&short_path);

        let mut provenance = Provenance {
            source,
            file_path: Some(short_path),
            file_line: location.line.map(str::to_string),
            slug: slug.clone(),
            description: message[..clause_start].to_string(),
            trailer: message[trailer_start..].to_string(),
            style: location.style,
            ..Default::default()
        };

        if let Some(slug) = slug {
            match source {
                Some(SourceKind::Theme) => self.resolve_theme(&mut provenance, &slug),
                Some(SourceKind::Plugin) => self.resolve_plugin(&mut provenance, &slug),
                _ => {}
            }
        }

        Some(provenance)
    }

    /// Replace the application root prefix with `/`.
    fn shorten(&self, path: &str) -> String {
        match path.strip_prefix(&self.app_root) {
            Some(rest) => format!("/{}", rest.trim_start_matches('/')),
            None => path.to_string(),
        }
    }

    fn resolve_theme(&self, provenance: &mut Provenance, slug: &str) {
        match self.registry.lookup_theme(slug) {
            Some(theme) => {
                provenance.name = Some(theme.name);
                provenance.uri = theme.uri;
            }
            None => provenance.name = Some(slug.to_string()),
        }
    }

    fn resolve_plugin(&self, provenance: &mut Provenance, slug: &str) {
        let plugins = self.plugins.get_or_init(|| self.registry.installed_plugins());
        match plugins.iter().find(|plugin| plugin.is_in_dir(slug)) {
            Some(plugin) => {
                provenance.name = Some(plugin.name.clone());
                provenance.uri = plugin.uri.clone();
                provenance.plugin_key = Some(plugin.key.clone());
            }
            None => provenance.name = Some(slug.to_string()),
        }
    }
}

/// A file location split out of a path clause.
struct Location<'m> {
    path: &'m str,
    line: Option<&'m str>,
    style: LocationStyle,
    /// Bytes of the clause covered by path and line.
    consumed: usize,
}

/// Split `clause` (starting at the path's leading `/`) into path and line number.
///
/// The preferred separator for the message shape is tried first, then the other one, so a
/// stack-trace message written with `on line` still resolves its line.
fn split_location(clause: &str, preferred: LocationStyle) -> Location<'_> {
    let attempts = match preferred {
        LocationStyle::Colon => [LocationStyle::Colon, LocationStyle::OnLine],
        LocationStyle::OnLine => [LocationStyle::OnLine, LocationStyle::Colon],
    };
    for style in attempts {
        let separator = match style {
            LocationStyle::Colon => ":",
            LocationStyle::OnLine => LINE_CLAUSE,
        };
        if let Some(idx) = clause.find(separator) {
            let after = idx + separator.len();
            let digits = leading_digits(&clause[after..]);
            if !digits.is_empty() {
                return Location {
                    path: clause[..idx].trim_end(),
                    line: Some(digits),
                    style,
                    consumed: after + digits.len(),
                };
            }
        }
    }

    // No line number: the path runs to the first whitespace or break marker.
    let end = clause
        .find(|c: char| c.is_whitespace())
        .unwrap_or(clause.len())
        .min(clause.find(SECTION_BREAK).unwrap_or(clause.len()));
    Location {
        path: &clause[..end],
        line: None,
        style: preferred,
        consumed: end,
    }
}

fn leading_digits(text: &str) -> &str {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    &text[..end]
}

/// Decide the owning component from a root-relative path.
///
/// Returns the source kind and, for themes and plugins, the directory directly below the
/// themes/plugins root.
pub fn classify_path(short_path: &str) -> (Option<SourceKind>, Option<String>) {
    if CORE_DIRS.iter().any(|dir| short_path.contains(dir)) {
        return (Some(SourceKind::Core), None);
    }
    let component = |dirs: &[&str]| {
        dirs.iter().find_map(|dir| {
            let idx = short_path.find(dir)?;
            let rest = &short_path[idx + dir.len()..];
            let slug = rest.split('/').next().unwrap_or(rest);
            (!slug.is_empty()).then(|| slug.to_string())
        })
    };
    if let Some(slug) = component(&THEME_DIRS) {
        return (Some(SourceKind::Theme), Some(slug));
    }
    if let Some(slug) = component(&PLUGIN_DIRS) {
        return (Some(SourceKind::Plugin), Some(slug));
    }
    (None, None)
}
