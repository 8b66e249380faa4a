//! Lookup file loader.
//!
//! The lookup ("database") file is plain text, one `KEY,VALUE` entry per
//! line. Field 0 is the placeholder key without delimiters, field 1 the
//! replacement value. A value containing a comma is truncated at the second
//! comma; a limitation of the format, kept rather than silently repaired.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Load the lookup mapping from `path`.
///
/// Empty lines are skipped; a non-empty line without a comma is an error.
/// Duplicate keys keep the last occurrence.
pub fn load(path: &Path) -> Result<HashMap<String, String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut lookup = HashMap::new();

    for (index, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',');
        let key = fields.next().unwrap_or_default();
        let Some(value) = fields.next() else {
            bail!(
                "{} line {}: expected KEY,VALUE",
                path.display(),
                index + 1
            );
        };

        lookup.insert(key.to_string(), value.to_string());
    }

    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_str(content: &str) -> Result<HashMap<String, String>> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load(file.path())
    }

    #[test]
    fn parses_key_value_lines() {
        let db = load_str("NAME,Alice\nCITY,Berlin\n").unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db["NAME"], "Alice");
        assert_eq!(db["CITY"], "Berlin");
    }

    #[test]
    fn handles_crlf_and_missing_final_newline() {
        let db = load_str("NAME,Alice\r\nCITY,Berlin").unwrap();
        assert_eq!(db["NAME"], "Alice");
        assert_eq!(db["CITY"], "Berlin");
    }

    #[test]
    fn last_duplicate_wins() {
        let db = load_str("K,first\nK,second\n").unwrap();
        assert_eq!(db["K"], "second");
    }

    #[test]
    fn embedded_comma_truncates_value() {
        // Known format limitation: only field 1 is kept
        let db = load_str("K,one,two\n").unwrap();
        assert_eq!(db["K"], "one");
    }

    #[test]
    fn empty_value_is_allowed() {
        let db = load_str("K,\n").unwrap();
        assert_eq!(db["K"], "");
    }

    #[test]
    fn line_without_comma_is_an_error() {
        let err = load_str("NAME Alice\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let db = load_str("NAME,Alice\n\nCITY,Berlin\n").unwrap();
        assert_eq!(db.len(), 2);
    }
}
