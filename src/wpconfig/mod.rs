//! Text-level editing of `wp-config.php`.
//!
//! Every public operation re-reads and re-parses the file, because other processes may edit
//! it between calls. Mutations replace only the exact text of the affected statement, so
//! unrelated content keeps its formatting byte for byte.

pub mod locate;
pub mod statement;

pub use locate::{locate_wp_config, ConfigLocation};
pub use statement::{ConfigStatement, ParsedConfig};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::model::WpConfigError;

/// Sentinel comments that mark the end of the editable section, in lookup order.
pub const ANCHORS: [&str; 2] = [
    "/* That's all, stop editing! Happy publishing. */",
    "/* That's all, stop editing! Happy blogging. */",
];

/// Kind of statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    /// `define( 'NAME', value );`
    Constant,
    /// `$name = value;`
    Variable,
}

impl ConfigKind {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKind::Constant => "constant",
            ConfigKind::Variable => "variable",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKind {
    type Err = WpConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(ConfigKind::Constant),
            "variable" => Ok(ConfigKind::Variable),
            other => Err(WpConfigError::UnknownConfigType(other.to_string())),
        }
    }
}

/// Where a new statement goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Anchor {
    /// The first of [`ANCHORS`] whose key phrase appears in the file.
    #[default]
    Auto,
    /// A caller-supplied anchor text.
    Text(String),
    /// Append at the end of the file.
    Eof,
}

/// Insert before or after the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// New statement, separator, anchor.
    #[default]
    Before,
    /// Anchor, separator, new statement.
    After,
}

/// Options for [`ConfigTransformer::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOptions {
    /// Write the value without quotes. `None` means raw only for `true`/`false`.
    pub raw: Option<bool>,
    /// Placement anchor.
    pub anchor: Anchor,
    /// Text between the statement and the anchor.
    pub separator: String,
    /// Placement relative to the anchor.
    pub placement: Placement,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            raw: None,
            anchor: Anchor::Auto,
            separator: "\n".to_string(),
            placement: Placement::Before,
        }
    }
}

impl AddOptions {
    /// Default placement with an explicit raw flag.
    pub fn raw(raw: bool) -> Self {
        Self {
            raw: Some(raw),
            ..Self::default()
        }
    }
}

/// Options for [`ConfigTransformer::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Add the statement when it is missing.
    pub add: bool,
    /// Write the value without quotes.
    pub raw: bool,
    /// Rewrite the whole statement in canonical form instead of swapping the value only.
    pub normalize: bool,
}

/// Reads, queries and edits one `wp-config.php` file.
#[derive(Debug)]
pub struct ConfigTransformer {
    path: PathBuf,
    /// Content as of the last read, for the unchanged-content check in [`Self::save`].
    last_read: String,
}

impl ConfigTransformer {
    /// Transformer for the file at `path`. Nothing is read until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_read: String::new(),
        }
    }

    /// Path of the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file.
    pub fn configs(&mut self) -> Result<ParsedConfig, WpConfigError> {
        self.read()?;
        Ok(statement::parse(&self.last_read))
    }

    /// Returns true if the statement is defined.
    pub fn exists(&mut self, kind: ConfigKind, name: &str) -> Result<bool, WpConfigError> {
        Ok(self.configs()?.contains(kind, name))
    }

    /// Raw value text of the statement, quotes included.
    pub fn get_value(&mut self, kind: ConfigKind, name: &str) -> Result<String, WpConfigError> {
        self.configs()?
            .get(kind, name)
            .map(|statement| statement.value.clone())
            .ok_or_else(|| WpConfigError::NotFound {
                kind,
                name: name.to_string(),
            })
    }

    /// Add a statement. Returns `Ok(false)` if it already exists.
    pub fn add(
        &mut self,
        kind: ConfigKind,
        name: &str,
        value: &str,
        options: &AddOptions,
    ) -> Result<bool, WpConfigError> {
        if self.exists(kind, name)? {
            return Ok(false);
        }

        let raw = options.raw.unwrap_or(matches!(value, "true" | "false"));
        let formatted = statement::format_value(value, raw).ok_or(WpConfigError::EmptyValue)?;
        let new_src = statement::normalize(kind, name, &formatted);

        let contents = match &options.anchor {
            Anchor::Eof => {
                let mut contents = self.last_read.clone();
                if !contents.ends_with('\n') {
                    contents.push_str(&options.separator);
                }
                contents.push_str(&new_src);
                contents.push_str(&options.separator);
                contents
            }
            anchor => {
                let anchor = match anchor {
                    Anchor::Text(text) => text.as_str(),
                    _ => self.detect_anchor().ok_or(WpConfigError::AnchorNotFound)?,
                };
                if !self.last_read.contains(anchor) {
                    return Err(WpConfigError::AnchorNotFound);
                }
                let replacement = match options.placement {
                    Placement::Before => format!("{new_src}{}{anchor}", options.separator),
                    Placement::After => format!("{anchor}{}{new_src}", options.separator),
                };
                self.last_read.replace(anchor, &replacement)
            }
        };

        tracing::info!(%kind, name, "Adding wp-config.php statement");
        self.save(&contents)
    }

    /// Change a statement's value.
    ///
    /// Returns `Ok(false)` when the statement is missing and `options.add` is unset, or when
    /// the file would not change.
    pub fn update(
        &mut self,
        kind: ConfigKind,
        name: &str,
        value: &str,
        options: UpdateOptions,
    ) -> Result<bool, WpConfigError> {
        let parsed = self.configs()?;
        let Some(existing) = parsed.get(kind, name) else {
            if options.add {
                return self.add(kind, name, value, &AddOptions::raw(options.raw));
            }
            return Ok(false);
        };

        let new_value = statement::format_value(value, options.raw).ok_or(WpConfigError::EmptyValue)?;
        let new_src = if options.normalize {
            statement::normalize(kind, name, &new_value)
        } else {
            let mut parts = existing.parts.clone();
            if !existing.value.is_empty() {
                parts[1] = parts[1].replace(existing.value.as_str(), &new_value);
            }
            parts.concat()
        };

        let contents = replace_at_boundaries(&self.last_read, existing.source.trim(), new_src.trim());
        if contents == self.last_read && existing.source.trim() != new_src.trim() {
            // Inline comments inside the statement keep the stripped snippet from matching.
            tracing::warn!(%kind, name, "Statement not found verbatim in wp-config.php, left unchanged");
            return Ok(false);
        }
        tracing::info!(%kind, name, "Updating wp-config.php statement");
        self.save(&contents)
    }

    /// Delete a statement and the whitespace after it. Returns `Ok(false)` if it is missing.
    pub fn remove(&mut self, kind: ConfigKind, name: &str) -> Result<bool, WpConfigError> {
        let parsed = self.configs()?;
        let Some(existing) = parsed.get(kind, name) else {
            return Ok(false);
        };

        let contents = remove_at_boundaries(&self.last_read, &existing.source);
        tracing::info!(%kind, name, "Removing wp-config.php statement");
        self.save(&contents)
    }

    /// Write new file contents under an exclusive lock.
    ///
    /// Returns `Ok(false)` when `contents` equals what was last read.
    pub fn save(&mut self, contents: &str) -> Result<bool, WpConfigError> {
        if contents.trim().is_empty() {
            return Err(WpConfigError::EmptyContent);
        }
        if contents == self.last_read {
            return Ok(false);
        }

        write_locked(&self.path, contents).map_err(|source| WpConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.last_read = contents.to_string();
        Ok(true)
    }

    fn read(&mut self) -> Result<(), WpConfigError> {
        let src = fs::read_to_string(&self.path).map_err(|source| WpConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        if src.trim().is_empty() {
            return Err(WpConfigError::EmptyFile {
                path: self.path.clone(),
            });
        }
        self.last_read = src;
        Ok(())
    }

    fn detect_anchor(&self) -> Option<&'static str> {
        let phrases = ["Happy publishing", "Happy blogging"];
        phrases
            .iter()
            .zip(ANCHORS)
            .find(|(phrase, _)| self.last_read.contains(*phrase))
            .map(|(_, anchor)| anchor)
    }
}

/// Replace each occurrence of `old` that is reachable from a statement boundary through
/// whitespace only. The whitespace itself is kept.
fn replace_at_boundaries(src: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return src.to_string();
    }
    let mut out = String::with_capacity(src.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = src[search..].find(old) {
        let start = search + found;
        let end = start + old.len();
        if preceded_by_boundary(src, copied, start) {
            out.push_str(&src[copied..start]);
            out.push_str(new);
            copied = end;
            search = end;
        } else {
            search = start + src[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out.push_str(&src[copied..]);
    out
}

/// True if some boundary position in `floor..=start` is followed only by whitespace up to
/// `start`.
fn preceded_by_boundary(src: &str, floor: usize, start: usize) -> bool {
    let mut pos = start;
    loop {
        if statement::is_boundary(src, pos) {
            return true;
        }
        if pos <= floor {
            return false;
        }
        match src.as_bytes()[pos - 1] {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c' => pos -= 1,
            _ => return false,
        }
    }
}

/// Delete each occurrence of `snippet` that starts exactly at a boundary, plus the
/// whitespace that follows it.
fn remove_at_boundaries(src: &str, snippet: &str) -> String {
    if snippet.is_empty() {
        return src.to_string();
    }
    let mut out = String::with_capacity(src.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = src[search..].find(snippet) {
        let start = search + found;
        if statement::is_boundary(src, start) {
            let rest = &src[start + snippet.len()..];
            let end = src.len() - rest.trim_start().len();
            out.push_str(&src[copied..start]);
            copied = end;
            search = end;
        } else {
            search = start + src[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out.push_str(&src[copied..]);
    out
}

#[cfg(unix)]
fn write_locked(path: &Path, contents: &str) -> io::Result<()> {
    use nix::fcntl::{Flock, FlockArg};
    use std::io::Write;

    let file = fs::OpenOptions::new().write(true).create(true).truncate(false).open(path)?;
    let mut locked =
        Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| io::Error::from(errno))?;
    locked.set_len(0)?;
    locked.write_all(contents.as_bytes())?;
    locked.flush()
}

#[cfg(not(unix))]
fn write_locked(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
#[path = "wpconfig_tests.rs"]
mod tests;
