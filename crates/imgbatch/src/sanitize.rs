//! Helpers for sanitizing data before it enters log fields.
//!
//! Image and webhook URLs come from caller-supplied spreadsheets and may
//! carry credentials or signed query strings; storage paths reveal the
//! host layout. These helpers keep both out of the logs.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Strips userinfo, query and fragment from a URL.
///
/// - `https://user:pw@host/a.jpg?sig=abc` → `https://****@host/a.jpg`
/// - `http://host/a.jpg` → `http://host/a.jpg` (no change)
///
/// Strings that do not parse as URLs are returned truncated, never echoed in full.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            let had_userinfo = !url.username().is_empty() || url.password().is_some();
            url.set_query(None);
            url.set_fragment(None);
            if had_userinfo {
                let _ = url.set_username("");
                let _ = url.set_password(None);
                let rendered = url.to_string();
                if let Some(scheme_end) = rendered.find("://") {
                    return format!(
                        "{}****@{}",
                        &rendered[..scheme_end + 3],
                        &rendered[scheme_end + 3..]
                    );
                }
                return rendered;
            }
            url.to_string()
        }
        Err(_) => truncate(raw, 64),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{}...", head)
}
