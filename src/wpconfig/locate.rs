//! Finding `wp-config.php` relative to the application root.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the config file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPlacement {
    /// Directly in the application root.
    Root,
    /// One level above the root, not belonging to another installation.
    Parent,
    /// In neither place.
    Undetectable,
}

impl fmt::Display for ConfigPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigPlacement::Root => "WordPress root directory",
            ConfigPlacement::Parent => "parent directory of WordPress root",
            ConfigPlacement::Undetectable => "not in WordPress root or its parent directory",
        })
    }
}

/// Result of locating the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    /// Resolved path, when found.
    pub path: Option<PathBuf>,
    /// Which candidate directory matched.
    pub placement: ConfigPlacement,
    /// Whether the file can be opened for writing.
    pub writable: bool,
}

impl ConfigLocation {
    /// One-line human-readable status.
    pub fn describe(&self) -> String {
        let path = self
            .path
            .as_ref()
            .map_or_else(|| "Undetectable.".to_string(), |p| p.display().to_string());
        let writability = if self.writable { "writeable" } else { "not writeable" };
        format!(
            "The wp-config.php file is located in {} ({}) and is {}.",
            self.placement, path, writability
        )
    }
}

/// Locate `wp-config.php` for the installation at `app_root`.
///
/// The root directory wins. The parent directory is used only when it does not hold
/// `wp-settings.php`, i.e. is not itself another installation.
pub fn locate_wp_config(app_root: &Path) -> ConfigLocation {
    let in_root = app_root.join("wp-config.php");
    if in_root.is_file() {
        return found(in_root, ConfigPlacement::Root);
    }

    if let Some(parent) = app_root.parent() {
        let in_parent = parent.join("wp-config.php");
        if in_parent.is_file() && !parent.join("wp-settings.php").exists() {
            return found(in_parent, ConfigPlacement::Parent);
        }
    }

    ConfigLocation {
        path: None,
        placement: ConfigPlacement::Undetectable,
        writable: false,
    }
}

fn found(path: PathBuf, placement: ConfigPlacement) -> ConfigLocation {
    let writable = fs::OpenOptions::new().append(true).open(&path).is_ok();
    ConfigLocation {
        path: Some(path),
        placement,
        writable,
    }
}
