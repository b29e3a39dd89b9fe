//! Recognizing `define()` constants and `$variable` assignments in PHP source.
//!
//! Statements only count when they begin at a statement boundary: start of file, start of a
//! line, right after `;`, or right after an opening `<?php`/`<?` tag and one whitespace
//! character. Comments are removed from a working copy first, so commented-out definitions
//! are never picked up.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::ConfigKind;

static CONSTANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?ims)\A([ \t]*define\s*\(\s*['"](\w*?)['"]\s*)(,\s*(''|""|'.*?[^\\]'|".*?[^\\]"|.*?)\s*)((?:,\s*(?:true|false)\s*)?\)\s*;)"#,
    )
    .expect("constant pattern is valid")
});

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ims)\A([ \t]*\$(\w+)\s*=)(\s*(''|""|'.*?[^\\]'|".*?[^\\]"|.*?)\s*;)"#)
        .expect("variable pattern is valid")
});

/// One recognized statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStatement {
    /// Constant or variable.
    pub kind: ConfigKind,
    /// Constant or variable name.
    pub name: String,
    /// Value exactly as written, quotes included.
    pub value: String,
    /// The full matched statement, leading indentation included.
    pub source: String,
    /// Statement split into head, value clause and (for constants) tail. Concatenated they
    /// equal `source`.
    pub parts: Vec<String>,
}

/// Statements by kind and name.
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    constants: HashMap<String, ConfigStatement>,
    variables: HashMap<String, ConfigStatement>,
}

impl ParsedConfig {
    /// Look up a statement.
    pub fn get(&self, kind: ConfigKind, name: &str) -> Option<&ConfigStatement> {
        self.table(kind).get(name)
    }

    /// Returns true if the statement is defined.
    pub fn contains(&self, kind: ConfigKind, name: &str) -> bool {
        self.table(kind).contains_key(name)
    }

    /// Names defined for `kind`, sorted.
    pub fn names(&self, kind: ConfigKind) -> Vec<&str> {
        let mut names: Vec<&str> = self.table(kind).keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn table(&self, kind: ConfigKind) -> &HashMap<String, ConfigStatement> {
        match kind {
            ConfigKind::Constant => &self.constants,
            ConfigKind::Variable => &self.variables,
        }
    }
}

/// Parse all constants and variables out of `src`.
///
/// For repeated names the last definition wins.
pub fn parse(src: &str) -> ParsedConfig {
    let work = strip_comments(src);
    let mut parsed = ParsedConfig::default();

    for statement in scan(&work, &CONSTANT_RE, ConfigKind::Constant) {
        parsed.constants.insert(statement.name.clone(), statement);
    }
    for statement in scan(&work, &VARIABLE_RE, ConfigKind::Variable) {
        parsed.variables.insert(statement.name.clone(), statement);
    }
    parsed
}

/// Match `re` at every boundary position, left to right, without overlaps.
fn scan(work: &str, re: &Regex, kind: ConfigKind) -> Vec<ConfigStatement> {
    let mut found = Vec::new();
    let mut resume = 0;

    for pos in 0..=work.len() {
        if pos < resume || !is_boundary(work, pos) {
            continue;
        }
        let Some(caps) = re.captures(&work[pos..]) else {
            continue;
        };
        let whole = caps.get(0).map_or("", |m| m.as_str());
        if whole.is_empty() {
            continue;
        }
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
        let parts = match kind {
            ConfigKind::Constant => vec![group(1), group(3), group(5)],
            ConfigKind::Variable => vec![group(1), group(3)],
        };
        found.push(ConfigStatement {
            kind,
            name: group(2),
            value: group(4),
            source: whole.to_string(),
            parts,
        });
        resume = pos + whole.len();
    }
    found
}

/// Returns true if a statement may start at byte offset `pos`.
pub(crate) fn is_boundary(text: &str, pos: usize) -> bool {
    if pos == 0 {
        return true;
    }
    let bytes = text.as_bytes();
    match bytes[pos - 1] {
        b';' | b'\n' => true,
        ws if is_php_space(ws) => {
            let before = &bytes[..pos - 1];
            ends_with_ignore_case(before, b"<?php") || before.ends_with(b"<?")
        }
        _ => false,
    }
}

fn is_php_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

fn ends_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len()
        && haystack[haystack.len() - needle.len()..].eq_ignore_ascii_case(needle)
}

/// Remove `//`, `#` and `/* */` comments that sit outside string literals.
///
/// Line comments stop before the newline (or a closing `?>`). `#[` starts an attribute, not
/// a comment.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let rest = &src[idx..];
        match ch {
            '\'' | '"' => {
                out.push(ch);
                let mut escaped = false;
                for (_, c) in chars.by_ref() {
                    out.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == ch {
                        break;
                    }
                }
            }
            '/' if rest.starts_with("/*") => {
                let end = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                while chars.peek().is_some_and(|&(i, _)| i < idx + end) {
                    chars.next();
                }
            }
            '/' | '#' if rest.starts_with("//") || (ch == '#' && !rest.starts_with("#[")) => {
                while let Some(&(i, c)) = chars.peek() {
                    if c == '\n' || src[i..].starts_with("?>") {
                        break;
                    }
                    chars.next();
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Quote a value the way PHP's `var_export` writes strings, unless `raw`.
pub fn format_value(value: &str, raw: bool) -> Option<String> {
    if raw {
        return (!value.trim().is_empty()).then(|| value.to_string());
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    Some(format!("'{escaped}'"))
}

/// Contents of a single- or double-quoted string literal, `None` for any other expression.
///
/// Only the `\\` and quote escapes are resolved.
pub fn unquote(value: &str) -> Option<String> {
    let value = value.trim();
    let quote = value.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    let inner = value.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) if next == quote || next == '\\' => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Canonical statement text for a name/value pair.
pub fn normalize(kind: ConfigKind, name: &str, value: &str) -> String {
    match kind {
        ConfigKind::Constant => format!("define( '{name}', {value} );"),
        ConfigKind::Variable => format!("${name} = {value};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?php
/**
 * The base configuration for WordPress
 */
define( 'DB_NAME', 'wordpress' );
define('DB_HOST', "localhost");
  define( 'WP_DEBUG', false );
// define( 'COMMENTED', true );
# define( 'HASHED', true );
/* define( 'BLOCKED', true ); */
define( 'WP_CACHE', true, false ); $table_prefix = 'wp_';
$table_prefix = 'custom_';
echo "define( 'IN_STRING', 1 );";

/* That's all, stop editing! Happy publishing. */
"#;

    #[test]
    fn parses_constants_with_parts() {
        let parsed = parse(SAMPLE);

        let db = parsed.get(ConfigKind::Constant, "DB_NAME").unwrap();
        assert_eq!(db.value, "'wordpress'");
        assert_eq!(db.source, "define( 'DB_NAME', 'wordpress' );");
        assert_eq!(db.parts.concat(), db.source);
        assert_eq!(db.parts[1], ", 'wordpress' ");

        assert_eq!(parsed.get(ConfigKind::Constant, "DB_HOST").unwrap().value, "\"localhost\"");
        assert_eq!(
            parsed.get(ConfigKind::Constant, "WP_DEBUG").unwrap().source,
            "  define( 'WP_DEBUG', false );"
        );
        assert_eq!(parsed.get(ConfigKind::Constant, "WP_CACHE").unwrap().value, "true");
    }

    #[test]
    fn comments_and_strings_are_ignored() {
        let parsed = parse(SAMPLE);
        for name in ["COMMENTED", "HASHED", "BLOCKED", "IN_STRING"] {
            assert!(!parsed.contains(ConfigKind::Constant, name), "{name}");
        }
    }

    #[test]
    fn last_variable_definition_wins() {
        let parsed = parse(SAMPLE);
        let prefix = parsed.get(ConfigKind::Variable, "table_prefix").unwrap();
        assert_eq!(prefix.value, "'custom_'");
        assert_eq!(parsed.names(ConfigKind::Variable), vec!["table_prefix"]);
    }

    #[test]
    fn statement_after_semicolon_is_recognized() {
        let parsed = parse("<?php $a = 1; $b = 'two';");
        assert_eq!(parsed.get(ConfigKind::Variable, "a").unwrap().value, "1");
        assert_eq!(parsed.get(ConfigKind::Variable, "b").unwrap().value, "'two'");
    }

    #[test]
    fn mid_token_lookalike_is_not_a_statement() {
        let parsed = parse("<?php\nfoo_define( 'X', 1 );\n");
        assert!(!parsed.contains(ConfigKind::Constant, "X"));
    }

    #[test]
    fn escaped_quote_inside_value() {
        let parsed = parse("<?php\ndefine( 'AUTH_KEY', 'a\\'b;c' );\n");
        assert_eq!(parsed.get(ConfigKind::Constant, "AUTH_KEY").unwrap().value, "'a\\'b;c'");
    }

    #[test]
    fn boundary_positions() {
        let text = "<?php x;y\nz";
        assert!(is_boundary(text, 0));
        assert!(is_boundary(text, 6));
        assert!(!is_boundary(text, 7));
        assert!(is_boundary(text, 8));
        assert!(is_boundary(text, 10));
        assert!(is_boundary("<?PHP\tx", 6));
    }

    #[test]
    fn strip_comments_keeps_newlines_and_strings() {
        let src = "a // one\nb # two\nc /* three */ d 'x // y' #[Attr]\n";
        assert_eq!(strip_comments(src), "a \nb \nc  d 'x // y' #[Attr]\n");
    }

    #[test]
    fn format_value_quotes_like_var_export() {
        assert_eq!(format_value("it's", false).as_deref(), Some("'it\\'s'"));
        assert_eq!(format_value("C:\\logs", false).as_deref(), Some("'C:\\\\logs'"));
        assert_eq!(format_value("true", true).as_deref(), Some("true"));
        assert_eq!(format_value("  ", true), None);
        assert_eq!(format_value("", false).as_deref(), Some("''"));
    }

    #[test]
    fn unquote_string_literals() {
        assert_eq!(unquote("'/tmp/debug.log'").as_deref(), Some("/tmp/debug.log"));
        assert_eq!(unquote("\"it's\"").as_deref(), Some("it's"));
        assert_eq!(unquote("'it\\'s'").as_deref(), Some("it's"));
        assert_eq!(unquote("'C:\\\\logs'").as_deref(), Some("C:\\logs"));
        assert_eq!(unquote("true"), None);
        assert_eq!(unquote("ABSPATH . 'x'"), None);
        assert_eq!(unquote("'"), None);
    }

    #[test]
    fn normalize_statements() {
        assert_eq!(
            normalize(ConfigKind::Constant, "WP_DEBUG", "true"),
            "define( 'WP_DEBUG', true );"
        );
        assert_eq!(normalize(ConfigKind::Variable, "table_prefix", "'wp_'"), "$table_prefix = 'wp_';");
    }
}
