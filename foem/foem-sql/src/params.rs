//! Query parameter markers.
//!
//! Benchmark queries are templated with Python `pyformat` markers
//! (`%(name)s`), which no SQL parser accepts. Before parsing they are
//! rewritten to named `:name` placeholders, the form a driver binds again
//! after transpilation.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

fn pyformat_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"%\((?P<name>\w+)\)s").unwrap())
}

/// Rewrite every `%(name)s` marker in `sql` to `:name`.
///
/// Returns the input unchanged (and unallocated) when there is no marker.
pub fn normalize_pyformat(sql: &str) -> Cow<'_, str> {
    pyformat_marker().replace_all(sql, ":$name")
}

/// Whether `sql` still contains something that looks like a `pyformat`
/// marker.
pub fn has_pyformat(sql: &str) -> bool {
    pyformat_marker().is_match(sql)
}
