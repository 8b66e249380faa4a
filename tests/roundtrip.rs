//! Archive round-trip and end-to-end substitution tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use docfill::{pack_directory, rewrite_file, LocalFileReader, ZipExtractor, ZipFileEntry};

const DOCUMENT_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
    <w:document><w:body><w:p><w:r><w:t>Dear %%NAME%%, welcome to %%CITY%%. \
    Your code is %%CODE%%.</w:t></w:r></w:p></w:body></w:document>";

const CONTENT_TYPES: &str = "<?xml version=\"1.0\"?><Types></Types>";

/// Lay out a minimal docx-shaped tree under `root`.
fn build_package_tree(root: &Path) {
    fs::create_dir_all(root.join("word").join("media")).unwrap();
    fs::create_dir_all(root.join("_rels")).unwrap();
    fs::write(root.join("[Content_Types].xml"), CONTENT_TYPES).unwrap();
    fs::write(root.join("_rels").join(".rels"), "<Relationships/>").unwrap();
    fs::write(root.join("word").join("document.xml"), DOCUMENT_XML).unwrap();
    // word/media stays empty: directory entries must survive the round trip
}

fn open_extractor(archive: &Path) -> ZipExtractor<LocalFileReader> {
    ZipExtractor::new(Arc::new(LocalFileReader::new(archive).unwrap()))
}

fn entry_names(entries: &[ZipFileEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.file_name.clone()).collect();
    names.sort();
    names
}

#[test]
fn pack_then_unpack_reproduces_every_byte() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("staging");
    build_package_tree(&source);

    let archive = dir.path().join("out.docx");
    let count = pack_directory(&source, &archive).unwrap();
    // 3 files + word/ + word/media/ + _rels/
    assert_eq!(count, 6);

    let extractor = open_extractor(&archive);
    let unpacked = dir.path().join("unpacked");
    assert_eq!(extractor.unpack(&unpacked).unwrap(), 6);

    for member in [
        "[Content_Types].xml",
        "_rels/.rels",
        "word/document.xml",
    ] {
        let original = fs::read(source.join(member)).unwrap();
        let round_tripped = fs::read(unpacked.join(member)).unwrap();
        assert_eq!(original, round_tripped, "content differs for {member}");
    }

    // The empty directory came back as a directory
    assert!(unpacked.join("word").join("media").is_dir());
}

#[test]
fn archive_names_are_relative_to_the_staging_root() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("staging");
    build_package_tree(&source);

    let archive = dir.path().join("out.docx");
    pack_directory(&source, &archive).unwrap();

    let entries = open_extractor(&archive).list_entries().unwrap();
    assert_eq!(
        entry_names(&entries),
        vec![
            "[Content_Types].xml",
            "_rels/",
            "_rels/.rels",
            "word/",
            "word/document.xml",
            "word/media/",
        ]
    );

    for entry in &entries {
        assert_eq!(entry.is_directory, entry.file_name.ends_with('/'));
    }
}

#[test]
fn repacking_the_same_tree_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("staging");
    build_package_tree(&source);

    let first = dir.path().join("a.docx");
    let second = dir.path().join("b.docx");
    pack_directory(&source, &first).unwrap();
    pack_directory(&source, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[cfg(unix)]
#[test]
fn symlinks_are_skipped_not_errors() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("staging");
    build_package_tree(&source);
    std::os::unix::fs::symlink(
        source.join("word").join("document.xml"),
        source.join("link.xml"),
    )
    .unwrap();

    let archive = dir.path().join("out.docx");
    pack_directory(&source, &archive).unwrap();

    let entries = open_extractor(&archive).list_entries().unwrap();
    assert!(entries.iter().all(|e| e.file_name != "link.xml"));
}

#[test]
fn unpack_rejects_non_zip_input() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("not-a-zip.docx");
    fs::write(&bogus, "this is plain text, not an archive").unwrap();

    let extractor = open_extractor(&bogus);
    let err = extractor.unpack(&dir.path().join("unpacked")).unwrap_err();
    assert!(err.to_string().contains("not a valid ZIP file"));
}

#[test]
fn missing_source_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = pack_directory(
        &dir.path().join("absent"),
        &dir.path().join("out.docx"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[test]
fn end_to_end_substitution_alters_only_the_document_member() {
    let dir = tempfile::tempdir().unwrap();

    // Build the input package
    let source = dir.path().join("template");
    build_package_tree(&source);
    let input = dir.path().join("input.docx");
    pack_directory(&source, &input).unwrap();

    let mut lookup = HashMap::new();
    lookup.insert("NAME".to_string(), "Alice".to_string());
    lookup.insert("CITY".to_string(), "Berlin".to_string());
    // CODE is deliberately absent

    // The orchestrator sequence: unpack, rewrite, repack
    let staging = dir.path().join("staging");
    open_extractor(&input).unpack(&staging).unwrap();
    let report = rewrite_file(&staging.join("word").join("document.xml"), &lookup).unwrap();
    assert_eq!(report.substituted_lines, 1);
    let output = dir.path().join("output.docx");
    pack_directory(&staging, &output).unwrap();

    // Compare input and output member by member
    let input_extractor = open_extractor(&input);
    let output_extractor = open_extractor(&output);
    let input_entries = input_extractor.list_entries().unwrap();
    let output_entries = output_extractor.list_entries().unwrap();

    // The archive path set is unchanged
    assert_eq!(entry_names(&input_entries), entry_names(&output_entries));

    for entry in output_entries.iter().filter(|e| !e.is_directory) {
        let data = output_extractor.extract_to_memory(entry).unwrap();
        if entry.file_name == "word/document.xml" {
            let text = String::from_utf8(data).unwrap();
            assert!(text.contains("Dear Alice, welcome to Berlin. Your code is _______."));
            assert!(!text.contains("%%"));
        } else {
            let original = input_entries
                .iter()
                .find(|e| e.file_name == entry.file_name)
                .unwrap();
            assert_eq!(
                input_extractor.extract_to_memory(original).unwrap(),
                data,
                "member {} changed across the run",
                entry.file_name
            );
        }
    }
}
