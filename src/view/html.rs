//! HTML fragments for the details column.

use crate::model::{AggregatedEntry, LocationStyle, Provenance, SourceKind};
use crate::parser::segment::SECTION_BREAK;

/// Base URL of the core source browser.
pub const CORE_SOURCE_BROWSER: &str = "https://core.trac.wordpress.org/browser/tags";

/// Values the details column depends on, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Running core version, for source-browser links.
    pub app_version: String,
    /// Admin base URL ending in `/`, for file-editor links.
    pub admin_url: String,
    /// File editing is disallowed; no editor links are produced.
    pub file_edit_disallowed: bool,
    /// Minutes added to UTC log timestamps for display.
    pub utc_offset_minutes: i32,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            app_version: "6.4".to_string(),
            admin_url: "/wp-admin/".to_string(),
            file_edit_disallowed: false,
            utc_offset_minutes: 0,
        }
    }
}

/// Escape text for HTML, keeping the segmenter's break markers.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out.replace("&lt;hr /&gt;", SECTION_BREAK)
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace(SECTION_BREAK, "")
}

/// Pretty-print details that are a JSON object or array.
pub fn pretty_json(details: &str) -> Option<String> {
    let trimmed = details.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(details).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Details column for one record.
pub fn details_html(entry: &AggregatedEntry, ctx: &RenderContext) -> String {
    if let Some(json) = pretty_json(&entry.details) {
        return format!("<pre>{}</pre>", escape_html(&json));
    }
    match &entry.provenance {
        Some(provenance) => provenance_html(provenance, ctx),
        None => escape_html(&entry.details),
    }
}

fn provenance_html(p: &Provenance, ctx: &RenderContext) -> String {
    let path = p.file_path.as_deref().unwrap_or_default();
    let location = match source_link(p, ctx) {
        Some(url) => format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_attr(&url),
            escape_html(path)
        ),
        None => escape_html(path),
    };
    let line = match (&p.file_line, p.style) {
        (Some(line), LocationStyle::Colon) => format!(":{}", escape_html(line)),
        (Some(line), LocationStyle::OnLine) => format!(" on line {}", escape_html(line)),
        (None, _) => String::new(),
    };

    let mut html = format!(
        "{} in {}{}{}",
        escape_html(&p.description),
        location,
        line,
        escape_html(&p.trailer)
    );
    if let Some(source) = source_label(p) {
        html.push_str(SECTION_BREAK);
        html.push_str(&format!("<span class=\"dlm-source\">{source}</span>"));
    }
    html
}

fn source_label(p: &Provenance) -> Option<String> {
    let kind = match p.source? {
        SourceKind::Core => return Some("WordPress core".to_string()),
        SourceKind::Theme => "Theme",
        SourceKind::Plugin => "Plugin",
    };
    let name = escape_html(p.name.as_deref()?);
    Some(match &p.uri {
        Some(uri) => format!(
            "{kind}: <a href=\"{}\" target=\"_blank\">{name}</a>",
            escape_attr(uri)
        ),
        None => format!("{kind}: {name}"),
    })
}

/// Link target for the file in `p`, if one should be shown.
pub fn source_link(p: &Provenance, ctx: &RenderContext) -> Option<String> {
    let path = p.file_path.as_deref()?;
    let anchor = p
        .file_line
        .as_deref()
        .map(|line| format!("#L{line}"))
        .unwrap_or_default();
    match p.source? {
        SourceKind::Core => Some(format!(
            "{CORE_SOURCE_BROWSER}/{}{path}{anchor}",
            ctx.app_version
        )),
        _ if ctx.file_edit_disallowed => None,
        SourceKind::Theme => Some(format!(
            "{}theme-editor.php?file={}&theme={}",
            ctx.admin_url,
            p.component_relative_path()?,
            p.slug.as_deref()?
        )),
        SourceKind::Plugin => {
            let slug = p.slug.as_deref()?;
            let key = p.plugin_key.as_deref().unwrap_or(slug);
            Some(format!(
                "{}plugin-editor.php?file={slug}/{}&plugin={key}",
                ctx.admin_url,
                p.component_relative_path()?
            ))
        }
    }
}
