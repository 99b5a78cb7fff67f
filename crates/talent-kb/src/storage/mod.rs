//! Storage implementations for candidate records and their vectors

pub mod flat_index;
pub mod migrations;
pub mod sqlite;

pub use flat_index::FlatFileIndex;
pub use sqlite::SqliteAttributeStore;

/// Escapes `LIKE` wildcards so user text matches literally under `ESCAPE '\'`.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
