//! The debug log manager: one object wiring the log file, the parsing pipeline and the
//! `wp-config.php` transformer together.
//!
//! Every operation re-reads what it needs. Nothing is cached between calls, so the
//! manager can be built once per process or once per request.

use crate::config::ResolvedConfig;
use crate::model::{AggregatedEntry, AppError, InputError};
use crate::parser::{Classifier, LogPipeline, SegmentOptions};
use crate::registry::{ComponentRegistry, FallbackRegistry, FilesystemRegistry};
use crate::source::{JsError, LogFile};
use crate::view::{self, DashboardEntry, EntryRow, RenderContext};
use crate::wpconfig::statement::unquote;
use crate::wpconfig::{locate_wp_config, ConfigKind, ConfigLocation, ConfigTransformer, UpdateOptions};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const WP_DEBUG: &str = "WP_DEBUG";
/// Points the runtime at its log file.
const WP_DEBUG_LOG: &str = "WP_DEBUG_LOG";
const WP_DEBUG_DISPLAY: &str = "WP_DEBUG_DISPLAY";
const SCRIPT_DEBUG: &str = "SCRIPT_DEBUG";
const DISALLOW_FILE_EDIT: &str = "DISALLOW_FILE_EDIT";

/// Placed next to the managed log so the directory listing stays empty.
const INDEX_GUARD: &str = "<?php // Nothing to show here";

/// Whether the runtime writes to the managed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingStatus {
    /// `WP_DEBUG_LOG` points at the managed log.
    Enabled,
    /// Anything else.
    Disabled,
}

/// Parsed view of the log at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct EntriesSnapshot {
    /// Master list, most recently seen message first.
    #[serde(skip)]
    pub records: Vec<AggregatedEntry>,
    /// Table rows for `records`.
    pub rows: Vec<EntryRow>,
    /// Log size in bytes.
    pub bytes: u64,
    /// Log size, human readable.
    pub size: String,
}

/// Result of enabling or disabling logging.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    /// Status after the toggle.
    pub status: LoggingStatus,
    /// A previous debug log was moved into the managed log.
    pub copied: bool,
    /// Fresh rows after enabling; empty after disabling.
    pub entries: Vec<EntryRow>,
    /// Log size after enabling; empty after disabling.
    pub size: String,
}

/// Composition root for every operation the host exposes.
pub struct DebugLogManager {
    pipeline: LogPipeline,
    log: LogFile,
    wp_config_path: Option<PathBuf>,
    app_root: PathBuf,
    content_dir: PathBuf,
    modify_script_debug: bool,
    site_url: String,
    js_error_logging: bool,
    render: RenderContext,
    file_edit_override: Option<bool>,
}

impl DebugLogManager {
    /// Build from resolved settings. Plugins and themes listed in the settings take
    /// precedence over headers read from the content directory.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let on_disk = Box::new(FilesystemRegistry::new(config.content_dir.clone()));
        let static_registry = config.static_registry();
        let registry: Box<dyn ComponentRegistry> = if static_registry.is_empty() {
            on_disk
        } else {
            Box::new(FallbackRegistry::new(Box::new(static_registry), on_disk))
        };
        Self::with_registry(config, registry)
    }

    /// Build from resolved settings with an explicit registry.
    pub fn with_registry(config: &ResolvedConfig, registry: Box<dyn ComponentRegistry>) -> Self {
        let pipeline = LogPipeline::new(config.app_root.to_string_lossy(), registry)
            .with_classifier(Classifier::with_extra_rules(config.category_rules()))
            .with_segment_options(SegmentOptions {
                max_entries: config.max_entries,
                non_utc_timezones: config.process_non_utc_timezones,
            });

        Self {
            pipeline,
            log: LogFile::new(config.debug_log_path.clone()),
            wp_config_path: config.wp_config_path.clone(),
            app_root: config.app_root.clone(),
            content_dir: config.content_dir.clone(),
            modify_script_debug: config.modify_script_debug,
            site_url: config.site_url.clone(),
            js_error_logging: config.js_error_logging,
            render: RenderContext {
                app_version: config.app_version.clone(),
                admin_url: config.admin_url.clone(),
                file_edit_disallowed: false,
                utc_offset_minutes: config.display_utc_offset_minutes,
            },
            file_edit_override: config.file_edit_disallowed,
        }
    }

    /// The managed log file.
    pub fn log_file(&self) -> &LogFile {
        &self.log
    }

    /// Where `wp-config.php` is, searched from the install root.
    pub fn locate(&self) -> ConfigLocation {
        locate_wp_config(&self.app_root)
    }

    /// Transformer for the configured or located `wp-config.php`.
    pub fn wp_config(&self) -> Result<ConfigTransformer, AppError> {
        let path = match &self.wp_config_path {
            Some(path) => Some(path.clone()),
            None => self.locate().path,
        };
        path.map(ConfigTransformer::new)
            .ok_or_else(|| AppError::WpConfigMissing {
                app_root: self.app_root.clone(),
            })
    }

    /// Parse the log into the master list. A missing log reads as empty.
    pub fn records(&self) -> Result<Vec<AggregatedEntry>, AppError> {
        let raw = match self.log.read() {
            Ok(raw) => raw,
            Err(InputError::FileNotFound { .. }) => String::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(self.pipeline.run(&raw))
    }

    /// Records, rows and size for the entries table.
    pub fn entries(&self) -> Result<EntriesSnapshot, AppError> {
        let records = self.records()?;
        let rows = view::to_rows(&records, &self.render_context());
        let bytes = self.log.size()?;
        Ok(EntriesSnapshot {
            records,
            rows,
            bytes,
            size: view::format_size(bytes),
        })
    }

    /// The first records, shaped for the dashboard summary.
    pub fn dashboard(&self, limit: usize) -> Result<Vec<DashboardEntry>, AppError> {
        let records = self.records()?;
        Ok(view::dashboard_entries(&records, &self.render_context(), limit))
    }

    /// Enabled when `WP_DEBUG_LOG` names the managed log.
    pub fn status(&self) -> Result<LoggingStatus, AppError> {
        let mut wp_config = self.wp_config()?;
        if !wp_config.exists(ConfigKind::Constant, WP_DEBUG_LOG)? {
            return Ok(LoggingStatus::Disabled);
        }
        let value = wp_config.get_value(ConfigKind::Constant, WP_DEBUG_LOG)?;
        let points_here = unquote(&value).is_some_and(|path| Path::new(&path) == self.log.path());
        Ok(if points_here {
            LoggingStatus::Enabled
        } else {
            LoggingStatus::Disabled
        })
    }

    /// Flip the current status.
    pub fn toggle(&self) -> Result<ToggleOutcome, AppError> {
        match self.status()? {
            LoggingStatus::Enabled => self.disable(),
            LoggingStatus::Disabled => self.enable(),
        }
    }

    /// Point the runtime at the managed log and return a fresh baseline.
    ///
    /// A log the runtime was already writing elsewhere is moved into the managed log first.
    pub fn enable(&self) -> Result<ToggleOutcome, AppError> {
        let mut wp_config = self.wp_config()?;
        let copied = self.migrate_previous_log(&mut wp_config)?;
        self.prepare_log_dir()?;

        let raw = UpdateOptions {
            add: true,
            raw: true,
            normalize: false,
        };
        let quoted = UpdateOptions { raw: false, ..raw };
        wp_config.update(ConfigKind::Constant, WP_DEBUG, "true", raw)?;
        wp_config.update(
            ConfigKind::Constant,
            WP_DEBUG_LOG,
            &self.log.path().to_string_lossy(),
            quoted,
        )?;
        wp_config.update(ConfigKind::Constant, WP_DEBUG_DISPLAY, "false", raw)?;
        if self.modify_script_debug {
            wp_config.update(ConfigKind::Constant, SCRIPT_DEBUG, "true", raw)?;
        }

        tracing::info!(log = %self.log.path().display(), copied, "Debug logging enabled");
        let snapshot = self.entries()?;
        Ok(ToggleOutcome {
            status: LoggingStatus::Enabled,
            copied,
            entries: snapshot.rows,
            size: snapshot.size,
        })
    }

    /// Remove the debug constants. The managed log is left in place.
    pub fn disable(&self) -> Result<ToggleOutcome, AppError> {
        let mut wp_config = self.wp_config()?;
        for name in [WP_DEBUG, WP_DEBUG_LOG, WP_DEBUG_DISPLAY] {
            wp_config.remove(ConfigKind::Constant, name)?;
        }
        if self.modify_script_debug {
            wp_config.remove(ConfigKind::Constant, SCRIPT_DEBUG)?;
        }

        tracing::info!("Debug logging disabled");
        Ok(ToggleOutcome {
            status: LoggingStatus::Disabled,
            copied: false,
            entries: Vec::new(),
            size: String::new(),
        })
    }

    /// Truncate the managed log.
    pub fn clear_log(&self) -> Result<(), AppError> {
        self.log.clear()?;
        Ok(())
    }

    /// Append a browser error to the managed log. Returns false when JavaScript error
    /// logging is switched off.
    pub fn log_js_error(&self, error: &JsError, now: DateTime<Utc>) -> Result<bool, AppError> {
        if !self.js_error_logging {
            tracing::debug!("JavaScript error logging disabled, error dropped");
            return Ok(false);
        }
        self.log.append_line(&error.to_log_line(&self.site_url, now))?;
        Ok(true)
    }

    /// Whether `DISALLOW_FILE_EDIT` is set to `true`.
    pub fn file_edit_disallowed(&self) -> Result<bool, AppError> {
        let mut wp_config = self.wp_config()?;
        if !wp_config.exists(ConfigKind::Constant, DISALLOW_FILE_EDIT)? {
            return Ok(false);
        }
        let value = wp_config.get_value(ConfigKind::Constant, DISALLOW_FILE_EDIT)?;
        Ok(value.trim().eq_ignore_ascii_case("true"))
    }

    /// Disallow (`true`) or allow (`false`) the built-in file editors.
    ///
    /// Returns false when the file already had the requested setting.
    pub fn set_file_editor(&self, disallowed: bool) -> Result<bool, AppError> {
        let mut wp_config = self.wp_config()?;
        let changed = if disallowed {
            wp_config.update(
                ConfigKind::Constant,
                DISALLOW_FILE_EDIT,
                "true",
                UpdateOptions {
                    add: true,
                    raw: true,
                    normalize: false,
                },
            )?
        } else {
            wp_config.remove(ConfigKind::Constant, DISALLOW_FILE_EDIT)?
        };
        tracing::info!(disallowed, changed, "File editor setting updated");
        Ok(changed)
    }

    /// Render settings, with the file-edit flag from settings or else `wp-config.php`.
    fn render_context(&self) -> RenderContext {
        let mut ctx = self.render.clone();
        ctx.file_edit_disallowed = match self.file_edit_override {
            Some(disallowed) => disallowed,
            None => self.file_edit_disallowed().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Cannot read DISALLOW_FILE_EDIT, assuming editing is allowed");
                false
            }),
        };
        ctx
    }

    /// Where the runtime logs to now, if `WP_DEBUG_LOG` is set.
    fn previous_log(&self, wp_config: &mut ConfigTransformer) -> Result<Option<PathBuf>, AppError> {
        if !wp_config.exists(ConfigKind::Constant, WP_DEBUG_LOG)? {
            return Ok(None);
        }
        let value = wp_config.get_value(ConfigKind::Constant, WP_DEBUG_LOG)?;
        let value = value.trim();
        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return Ok(Some(self.content_dir.join("debug.log")));
        }
        Ok(unquote(value).map(PathBuf::from))
    }

    fn migrate_previous_log(&self, wp_config: &mut ConfigTransformer) -> Result<bool, AppError> {
        let Some(previous) = self.previous_log(wp_config)? else {
            return Ok(false);
        };
        if previous.as_path() == self.log.path() || !previous.is_file() {
            return Ok(false);
        }

        let previous = LogFile::new(previous);
        self.log.ensure_exists()?;
        let bytes = self.log.append_from(&previous)?;
        previous.remove()?;
        tracing::info!(from = %previous.path().display(), bytes, "Moved previous debug log");
        Ok(true)
    }

    fn prepare_log_dir(&self) -> Result<(), AppError> {
        self.log.ensure_exists()?;
        if let Some(dir) = self.log.path().parent().filter(|p| !p.as_os_str().is_empty()) {
            let index = dir.join("index.php");
            if !index.exists() {
                fs::write(&index, INDEX_GUARD).map_err(|source| InputError::Io {
                    path: index.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
