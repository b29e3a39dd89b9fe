//! Debug Log Manager - Entry Point

use clap::{Parser, Subcommand, ValueEnum};
use dlm::parser::segment::SECTION_BREAK;
use dlm::service::{DebugLogManager, LoggingStatus};
use dlm::source::JsError;
use dlm::view::{self, DASHBOARD_LIMIT};
use dlm::wpconfig::{ConfigKind, UpdateOptions};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Debug Log Manager - inspect the PHP error log and toggle debug logging
#[derive(Parser, Debug)]
#[command(name = "dlm")]
#[command(version)]
#[command(about = "Parse, deduplicate and classify PHP error logs, and toggle debug logging")]
pub struct Args {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Application install root
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Managed debug log file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show deduplicated log entries, most recently seen first
    Entries {
        /// Only entries with this category label (e.g. "PHP Warning")
        #[arg(long)]
        category: Option<String>,
        /// Print table rows and size as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the dashboard summary
    Dashboard {
        /// Number of entries
        #[arg(long, default_value_t = DASHBOARD_LIMIT)]
        limit: usize,
    },
    /// Report whether debug logging points at the managed log
    Status,
    /// Enable debug logging if disabled, disable it if enabled
    Toggle {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Empty the managed log
    Clear,
    /// Query or edit wp-config.php statements
    Config {
        /// Statement operation
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Allow or disallow the built-in theme and plugin file editors
    FileEditor {
        /// New setting
        #[arg(value_enum)]
        state: EditorState,
    },
    /// Append a browser error, given as a JSON payload, to the managed log
    LogJsError {
        /// JSON payload; read from stdin when omitted
        payload: Option<String>,
    },
    /// Report where wp-config.php is and whether it is writable
    Locate,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print whether a statement is defined
    Exists {
        /// Constant or variable name
        name: String,
        /// Statement kind
        #[arg(long, default_value = "constant", value_parser = parse_kind)]
        kind: ConfigKind,
    },
    /// Print a statement's raw value
    Get {
        /// Constant or variable name
        name: String,
        /// Statement kind
        #[arg(long, default_value = "constant", value_parser = parse_kind)]
        kind: ConfigKind,
    },
    /// Add or update a statement
    Set {
        /// Constant or variable name
        name: String,
        /// New value
        value: String,
        /// Write the value unquoted
        #[arg(long)]
        raw: bool,
        /// Rewrite the statement in canonical form
        #[arg(long)]
        normalize: bool,
        /// Statement kind
        #[arg(long, default_value = "constant", value_parser = parse_kind)]
        kind: ConfigKind,
    },
    /// Delete a statement
    Remove {
        /// Constant or variable name
        name: String,
        /// Statement kind
        #[arg(long, default_value = "constant", value_parser = parse_kind)]
        kind: ConfigKind,
    },
}

/// File editor setting.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    /// Allow editing
    Enable,
    /// Disallow editing
    Disable,
}

fn parse_kind(s: &str) -> Result<ConfigKind, String> {
    s.parse().map_err(|e: dlm::model::WpConfigError| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = dlm::config::load_config_with_precedence(args.config.clone())?;
        let merged = dlm::config::merge_config(config_file);
        let with_env = dlm::config::apply_env_overrides(merged);
        dlm::config::apply_cli_overrides(with_env, args.root.clone(), args.log.clone())
    };

    dlm::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let manager = DebugLogManager::from_config(&config);
    run(&manager, args.command)
}

fn run(manager: &DebugLogManager, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Entries {
            category,
            json,
            limit,
        } => {
            let snapshot = manager.entries()?;
            if json {
                let mut rows = view::filter_rows(snapshot.rows, category.as_deref());
                rows.truncate(limit.unwrap_or(usize::MAX));
                let out = serde_json::json!({ "rows": rows, "size": snapshot.size });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            let records = snapshot
                .records
                .iter()
                .filter(|r| category.as_deref().map_or(true, |c| r.category.label() == c))
                .take(limit.unwrap_or(usize::MAX));
            for (i, record) in records.enumerate() {
                println!(
                    "{:>4}  {:<15} {:>6}x  last {}",
                    i + 1,
                    record.category.label(),
                    view::format_count(record.occurrence_count() as u64),
                    record.last_occurrence().unwrap_or_default()
                );
                for line in record.details.replace(SECTION_BREAK, "\n").lines() {
                    println!("      {line}");
                }
            }
            println!("Log size: {}", snapshot.size);
        }
        Command::Dashboard { limit } => {
            for entry in manager.dashboard(limit)? {
                println!("{}  {}  {}", entry.last_occurrence, entry.category, entry.details);
            }
        }
        Command::Status => {
            let status = manager.status()?;
            println!("{}", status_label(status));
        }
        Command::Toggle { json } => {
            let outcome = manager.toggle()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("Error logging {}", status_label(outcome.status));
                if outcome.copied {
                    println!("Previous debug log moved into {}", manager.log_file().path().display());
                }
                if outcome.status == LoggingStatus::Enabled {
                    println!("{} entries, {}", outcome.entries.len(), outcome.size);
                }
            }
        }
        Command::Clear => {
            manager.clear_log()?;
            println!("Cleared {}", manager.log_file().path().display());
        }
        Command::Config { action } => {
            let mut wp_config = manager.wp_config()?;
            match action {
                ConfigAction::Exists { name, kind } => println!("{}", wp_config.exists(kind, &name)?),
                ConfigAction::Get { name, kind } => println!("{}", wp_config.get_value(kind, &name)?),
                ConfigAction::Set {
                    name,
                    value,
                    raw,
                    normalize,
                    kind,
                } => {
                    let options = UpdateOptions {
                        add: true,
                        raw,
                        normalize,
                    };
                    let changed = wp_config.update(kind, &name, &value, options)?;
                    println!("{}", if changed { "updated" } else { "unchanged" });
                }
                ConfigAction::Remove { name, kind } => {
                    let removed = wp_config.remove(kind, &name)?;
                    println!("{}", if removed { "removed" } else { "not defined" });
                }
            }
        }
        Command::FileEditor { state } => {
            let changed = manager.set_file_editor(state == EditorState::Disable)?;
            let label = match state {
                EditorState::Enable => "allowed",
                EditorState::Disable => "disallowed",
            };
            println!("File editing {label}{}", if changed { "" } else { " (unchanged)" });
        }
        Command::LogJsError { payload } => {
            let payload = match payload {
                Some(payload) => payload,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let error: JsError = serde_json::from_str(&payload)?;
            if !manager.log_js_error(&error, chrono::Utc::now())? {
                eprintln!("JavaScript error logging is disabled");
            }
        }
        Command::Locate => println!("{}", manager.locate().describe()),
    }
    Ok(())
}

fn status_label(status: LoggingStatus) -> &'static str {
    match status {
        LoggingStatus::Enabled => "enabled",
        LoggingStatus::Disabled => "disabled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_does_not_error() {
        let err = Args::try_parse_from(["dlm", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let err = Args::try_parse_from(["dlm", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_command_is_required() {
        assert!(Args::try_parse_from(["dlm"]).is_err());
    }

    #[test]
    fn test_entries_defaults() {
        let args = Args::parse_from(["dlm", "entries"]);
        assert_eq!(
            args.command,
            Command::Entries {
                category: None,
                json: false,
                limit: None
            }
        );
        assert_eq!(args.config, None);
        assert_eq!(args.root, None);
    }

    #[test]
    fn test_entries_filters() {
        let args = Args::parse_from([
            "dlm",
            "entries",
            "--category",
            "PHP Warning",
            "--json",
            "--limit",
            "5",
        ]);
        assert_eq!(
            args.command,
            Command::Entries {
                category: Some("PHP Warning".to_string()),
                json: true,
                limit: Some(5)
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["dlm", "status", "--root", "/var/www/html", "--log", "/tmp/d.log"]);
        assert_eq!(args.root, Some(PathBuf::from("/var/www/html")));
        assert_eq!(args.log, Some(PathBuf::from("/tmp/d.log")));
        assert_eq!(args.command, Command::Status);
    }

    #[test]
    fn test_dashboard_limit_default() {
        let args = Args::parse_from(["dlm", "dashboard"]);
        assert_eq!(args.command, Command::Dashboard { limit: 10 });
    }

    #[test]
    fn test_config_set_variable() {
        let args = Args::parse_from([
            "dlm",
            "config",
            "set",
            "table_prefix",
            "wp_",
            "--kind",
            "variable",
        ]);
        assert_eq!(
            args.command,
            Command::Config {
                action: ConfigAction::Set {
                    name: "table_prefix".to_string(),
                    value: "wp_".to_string(),
                    raw: false,
                    normalize: false,
                    kind: ConfigKind::Variable,
                }
            }
        );
    }

    #[test]
    fn test_config_unknown_kind_rejected() {
        let err = Args::try_parse_from(["dlm", "config", "get", "X", "--kind", "setting"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_file_editor_state() {
        let args = Args::parse_from(["dlm", "file-editor", "disable"]);
        assert_eq!(
            args.command,
            Command::FileEditor {
                state: EditorState::Disable
            }
        );
        assert!(Args::try_parse_from(["dlm", "file-editor", "maybe"]).is_err());
    }

    #[test]
    fn test_log_js_error_payload_optional() {
        let args = Args::parse_from(["dlm", "log-js-error"]);
        assert_eq!(args.command, Command::LogJsError { payload: None });
    }

    #[test]
    fn test_root_flows_through_config_precedence_chain() {
        use dlm::config::{apply_cli_overrides, merge_config, ConfigFile};

        let config_file = ConfigFile {
            app_root: Some(PathBuf::from("/srv/file")),
            ..ConfigFile::default()
        };
        let merged = merge_config(Some(config_file));
        assert_eq!(merged.app_root, PathBuf::from("/srv/file"));

        let with_cli = apply_cli_overrides(merged, Some(PathBuf::from("/srv/cli")), None);
        assert_eq!(with_cli.app_root, PathBuf::from("/srv/cli"));
        assert_eq!(with_cli.content_dir, PathBuf::from("/srv/cli/wp-content"));
    }
}
