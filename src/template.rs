//! Placeholder scanning and substitution.
//!
//! Placeholders are `%%NAME%%` tokens: a name bounded by a two-character
//! delimiter on both sides, never spanning a line. [`find_placeholders`]
//! collects the tokens on one line, [`substitute_line`] rewrites them from a
//! lookup mapping, and [`rewrite_file`] drives the two over a whole file,
//! staging output through a temp file that is renamed into place on success
//! and removed on any failure.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Two-character placeholder delimiter, used on both sides of the name.
pub const DELIMITER: &str = "%%";

/// Written in place of a placeholder whose key has no lookup entry.
pub const FALLBACK_MARKER: &str = "_______";

/// Find the first placeholder in `text` at or after byte position `start`.
///
/// Returns the delimiter-inclusive token and the position immediately after
/// its closing delimiter, e.g. for `"an %%EXAMPLE%% here"` and `start == 0`
/// the result is `("%%EXAMPLE%%", 14)`.
///
/// An opening delimiter with no closing pair is not a placeholder; the scan
/// reports no match rather than slicing past the end of the line.
pub fn find_placeholder(text: &str, start: usize) -> Option<(&str, usize)> {
    let open = start + text[start..].find(DELIMITER)?;
    let after_open = open + DELIMITER.len();
    let close = after_open + text[after_open..].find(DELIMITER)?;
    let end = close + DELIMITER.len();
    Some((&text[open..end], end))
}

/// Collect every placeholder token on one line.
///
/// Set semantics are intentional: a token repeated on the line is replaced
/// at every occurrence in a single [`substitute_line`] pass, so one copy is
/// enough. The scan advances past each match, never revisiting earlier
/// positions, so it terminates in one pass over the line.
pub fn find_placeholders(text: &str) -> HashSet<&str> {
    let mut placeholders = HashSet::new();
    let mut start = 0;

    while let Some((token, end)) = find_placeholder(text, start) {
        placeholders.insert(token);
        start = end;
    }

    placeholders
}

/// True when the line ends with a lone opening delimiter after all complete
/// tokens are consumed. Recoverable; callers may warn but substitution
/// leaves the span untouched.
pub fn has_unterminated_delimiter(text: &str) -> bool {
    let mut start = 0;
    while let Some((_, end)) = find_placeholder(text, start) {
        start = end;
    }
    text[start..].contains(DELIMITER)
}

/// Replace every recognized placeholder on `line`.
///
/// A token whose bare key (delimiters stripped) is present in `lookup` is
/// replaced by the mapped value at every occurrence; an unknown key becomes
/// [`FALLBACK_MARKER`]. Replacement is literal substring substitution:
/// values containing delimiter characters are inserted verbatim and never
/// rescanned.
pub fn substitute_line(line: &str, lookup: &HashMap<String, String>) -> String {
    let mut result = line.to_string();

    for token in find_placeholders(line) {
        let key = &token[DELIMITER.len()..token.len() - DELIMITER.len()];
        let replacement = match lookup.get(key) {
            Some(value) => value.as_str(),
            None => FALLBACK_MARKER,
        };
        result = result.replace(token, replacement);
    }

    result
}

/// Outcome of a [`rewrite_file`] run.
pub struct RewriteReport {
    /// Lines read from the source file
    pub lines: usize,
    /// Lines that came out different after substitution
    pub substituted_lines: usize,
    /// 1-based numbers of lines carrying an unterminated opening delimiter
    pub unterminated_lines: Vec<usize>,
}

/// Substitute placeholders throughout the file at `path`, in place.
///
/// The file is processed line by line with terminators preserved, so only
/// placeholder spans can change and arbitrarily long files stream through a
/// small buffer. Output goes to a `<name>.tmp` sibling that replaces the
/// original only once every line has been written; on any failure the
/// staging file is removed and the original is left untouched.
pub fn rewrite_file(path: &Path, lookup: &HashMap<String, String>) -> Result<RewriteReport> {
    let source =
        fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut reader = BufReader::new(source);

    let (staging, out) = StagedFile::create(path)?;
    let mut writer = BufWriter::new(out);

    let mut report = RewriteReport {
        lines: 0,
        substituted_lines: 0,
        unterminated_lines: Vec::new(),
    };

    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if n == 0 {
            break;
        }
        report.lines += 1;

        if has_unterminated_delimiter(&line) {
            report.unterminated_lines.push(report.lines);
        }

        let replaced = substitute_line(&line, lookup);
        if replaced != line {
            report.substituted_lines += 1;
        }

        writer
            .write_all(replaced.as_bytes())
            .with_context(|| format!("cannot write {}", staging.path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("cannot write {}", staging.path.display()))?;
    drop(writer); // close before the rename, or Windows refuses it

    staging.persist(path)?;
    Ok(report)
}

/// Staged output file, removed on drop unless renamed into place.
struct StagedFile {
    path: PathBuf,
    persisted: bool,
}

impl StagedFile {
    /// Create `<target>.tmp` next to the target file.
    fn create(target: &Path) -> Result<(Self, fs::File)> {
        let Some(name) = target.file_name() else {
            bail!("{} has no file name", target.display());
        };

        let path = target.with_file_name(format!("{}.tmp", name.to_string_lossy()));
        let file = fs::File::create(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;

        Ok((
            Self {
                path,
                persisted: false,
            },
            file,
        ))
    }

    /// Move the staged file over `target`.
    fn persist(mut self, target: &Path) -> Result<()> {
        fs::rename(&self.path, target)
            .with_context(|| format!("cannot replace {}", target.display()))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}
