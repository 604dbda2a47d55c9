//! SQL identifier quoting.
//!
//! Bare column and table identifiers passed through builder methods are
//! wrapped in double quotes, segment by segment for dotted names
//! (`users.id` → `"users"."id"`). Anything that already looks like an
//! expression — containing `(`, whitespace, or an existing quote — passes
//! through verbatim, as does `*`. Raw expression text is never quoted.

/// Check whether a string is a plain (possibly dotted) identifier.
fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
                _ => return false,
            }
            chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
        })
}

/// Quote each segment of a dotted identifier.
fn quote_segments(s: &str) -> String {
    let parts: Vec<String> = s
        .split('.')
        .map(|seg| {
            if seg == "*" {
                seg.to_string()
            } else {
                format!("\"{seg}\"")
            }
        })
        .collect();
    parts.join(".")
}

/// Quote a column identifier.
///
/// `*` and trailing `.*` segments stay unquoted; expressions pass through.
pub fn quote_column(name: &str) -> String {
    if name == "*" {
        return name.to_string();
    }
    if let Some(prefix) = name.strip_suffix(".*") {
        if is_plain(prefix) {
            return format!("{}.*", quote_segments(prefix));
        }
    }
    if is_plain(name) {
        quote_segments(name)
    } else {
        name.to_string()
    }
}

/// Quote a table identifier.
pub fn quote_table(name: &str) -> String {
    if is_plain(name) {
        quote_segments(name)
    } else {
        name.to_string()
    }
}

/// Quote an ORDER BY entry, passing a trailing direction through verbatim.
pub fn quote_order_by(entry: &str) -> String {
    let trimmed = entry.trim();
    if let Some((col, dir)) = trimmed.rsplit_once(char::is_whitespace) {
        if dir.eq_ignore_ascii_case("ASC") || dir.eq_ignore_ascii_case("DESC") {
            return format!("{} {}", quote_column(col.trim_end()), dir);
        }
    }
    quote_column(trimmed)
}
