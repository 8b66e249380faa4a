//! # docfill
//!
//! A docx template filler: replaces `%%PLACEHOLDER%%` fields in the
//! `word/document.xml` member of a document package with values from a
//! `KEY,VALUE` lookup file, leaving every other byte of the package
//! untouched.
//!
//! The pieces compose as a pipeline: unpack the zip-based package into a
//! staging directory, rewrite the document member line by line, repack the
//! tree into a fresh archive with deflate compression.
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use docfill::substitute_line;
//!
//! let mut lookup = HashMap::new();
//! lookup.insert("NAME".to_string(), "Alice".to_string());
//!
//! let line = substitute_line("Hello %%NAME%%, your code is %%CODE%%.", &lookup);
//! assert_eq!(line, "Hello Alice, your code is _______.");
//! ```

pub mod cli;
pub mod io;
pub mod lookup;
pub mod template;
pub mod zip;

pub use cli::Cli;
pub use io::{LocalFileReader, ReadAt};
pub use template::{
    find_placeholder, find_placeholders, has_unterminated_delimiter, rewrite_file,
    substitute_line, RewriteReport, DELIMITER, FALLBACK_MARKER,
};
pub use zip::{pack_directory, ZipArchiveWriter, ZipExtractor, ZipFileEntry};
