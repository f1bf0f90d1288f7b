use pdfsearch_core::persist::{decode_index, encode_index, load_index, load_meta, save_index, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use pdfsearch_core::{build, search, IdfVariant, IndexConfig, IndexError, InvertedIndex, SourceDocument};
use std::fs;
use tempfile::tempdir;

fn sample_index(config: IndexConfig) -> InvertedIndex {
    build(
        &[
            SourceDocument::from_pages("a.pdf", &["Rust ownership and borrowing", "lifetimes in rust"]),
            SourceDocument::from_pages("b.pdf", &["Python garbage collection"]),
            SourceDocument::from_pages("c.pdf", &["rust belt history", "steel mills"]),
        ],
        config,
    )
}

#[test]
fn save_then_load_preserves_index_and_results() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::for_folder(dir.path());
    let index = sample_index(IndexConfig::default());

    save_index(&paths, &index).unwrap();
    let loaded = load_index(&paths).unwrap();

    assert_eq!(loaded, index);
    for q in ["rust", "steel history", "python rust lifetimes", "", "unknown"] {
        assert_eq!(search(&loaded, q), search(&index, q), "query {q:?}");
    }
}

#[test]
fn bytes_round_trip_keeps_config() {
    let index = sample_index(IndexConfig::smoothed());
    let decoded = decode_index(&encode_index(&index).unwrap()).unwrap();
    assert_eq!(decoded.config().idf, IdfVariant::Smoothed);
    assert_eq!(decoded.document_frequencies(), index.document_frequencies());
}

#[test]
fn empty_index_round_trips() {
    let index = build(&[], IndexConfig::default());
    let decoded = decode_index(&encode_index(&index).unwrap()).unwrap();
    assert_eq!(decoded.num_docs(), 0);
    assert!(search(&decoded, "anything").is_empty());
}

#[test]
fn missing_index_is_reported() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::for_folder(dir.path());
    assert!(!paths.index_exists());
    match load_index(&paths) {
        Err(IndexError::MissingIndex { path }) => assert_eq!(path, paths.index()),
        other => panic!("expected MissingIndex, got {other:?}"),
    }
}

#[test]
fn flipped_byte_is_corrupt() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::for_folder(dir.path());
    save_index(&paths, &sample_index(IndexConfig::default())).unwrap();

    let mut bytes = fs::read(paths.index()).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xff;
    fs::write(paths.index(), &bytes).unwrap();

    let err = load_index(&paths).unwrap_err();
    assert!(matches!(err, IndexError::CorruptIndex { .. }), "{err}");
    assert!(err.to_string().contains("--update"));
}

#[test]
fn truncated_and_foreign_bytes_are_corrupt() {
    let bytes = encode_index(&sample_index(IndexConfig::default())).unwrap();
    for bad in [&bytes[..bytes.len() - 3], &bytes[..6], b"not an index at all".as_slice(), &[][..]] {
        assert!(matches!(decode_index(bad), Err(IndexError::CorruptIndex { .. })));
    }
}

#[test]
fn other_format_version_is_rejected() {
    let mut bytes = encode_index(&sample_index(IndexConfig::default())).unwrap();
    bytes[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
    let err = decode_index(&bytes).unwrap_err();
    assert!(err.to_string().contains("format version"), "{err}");
}

#[test]
fn save_overwrites_previous_index() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::for_folder(dir.path());
    save_index(&paths, &sample_index(IndexConfig::default())).unwrap();

    let replacement = build(&[SourceDocument::from_pages("new.pdf", &["fresh content"])], IndexConfig::default());
    save_index(&paths, &replacement).unwrap();

    let loaded = load_index(&paths).unwrap();
    assert_eq!(loaded.num_docs(), 1);
    assert_eq!(loaded.docs()[0].name, "new.pdf");
}

#[test]
fn meta_file_round_trips() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::for_folder(dir.path());
    let index = sample_index(IndexConfig::smoothed());
    let meta = MetaFile::for_index(&index, "2024-01-01T00:00:00Z");
    save_meta(&paths, &meta).unwrap();

    let loaded = load_meta(&paths).unwrap();
    assert_eq!(loaded, meta);
    assert_eq!(loaded.num_docs, 3);
    assert_eq!(loaded.version, FORMAT_VERSION);
    assert_eq!(loaded.idf, IdfVariant::Smoothed);
}
