//! Filesystem-safe namespaces derived from product names.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_ ]+").expect("static regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("static regex"));

/// Lowercases `name`, drops everything but ASCII word characters and spaces,
/// and turns each run of spaces into a single hyphen.
///
/// Names differing only in case, punctuation or spacing map to the same slug
/// (`"Red Shoes!"` and `"red   shoes"` are both `red-shoes`); rows with such
/// names share one storage directory.
pub fn create_slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    SPACES.replace_all(&stripped, "-").into_owned()
}
