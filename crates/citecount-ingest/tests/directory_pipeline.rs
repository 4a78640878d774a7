//! Runs the full pipeline over files on disk.

use std::fs;
use std::sync::Arc;

use citecount_core::{Config, DecodeMode, OutputRecord, extract_citations};
use citecount_ingest::{DirectorySource, list_documents};

#[tokio::test]
async fn directory_documents_flow_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.txt"),
        "Roe v. Wade, 410 U.S. 113 (1973).\nSee 410 U.S., at 153.\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.txt"), "Brown, 347 U.S. 483, 495 (1954)\n").unwrap();
    fs::write(dir.path().join("c.bin"), [0xffu8, 0xfe, 0x00]).unwrap();

    let handles = list_documents(dir.path())
        .unwrap()
        .into_iter()
        .map(|e| e.handle)
        .collect::<Vec<_>>();
    assert_eq!(handles.len(), 3);

    let config = Config {
        load_workers: 4,
        aggregate_workers: 2,
        decode: DecodeMode::Strict,
    };
    let mut out: Vec<OutputRecord> = Vec::new();
    let stats = extract_citations(
        handles,
        &config,
        Arc::new(DirectorySource::new(dir.path())),
        &mut out,
        |_| {},
    )
    .await
    .unwrap();

    out.sort_by(|a, b| a.document.cmp(&b.document));
    let rows: Vec<(String, String, usize)> = out
        .into_iter()
        .map(|r| (r.document, r.citation.into_string(), r.count))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("a.txt".to_string(), "410 U.S. 113".to_string(), 2),
            ("b.txt".to_string(), "347 U.S. 483".to_string(), 1),
        ]
    );
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.failed, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn non_utf8_file_name_produces_records() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    // Some filesystems reject names that are not valid UTF-8.
    if fs::write(
        dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")),
        "410 U.S. 113 (1973)\n410 U.S., at 153\n",
    )
    .is_err()
    {
        return;
    }

    let handles = list_documents(dir.path())
        .unwrap()
        .into_iter()
        .map(|e| e.handle)
        .collect::<Vec<_>>();
    let config = Config {
        load_workers: 1,
        aggregate_workers: 1,
        decode: DecodeMode::Strict,
    };
    let mut out: Vec<OutputRecord> = Vec::new();
    let stats = extract_citations(
        handles,
        &config,
        Arc::new(DirectorySource::new(dir.path())),
        &mut out,
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(stats.failed, 0);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].document, "caf\u{FFFD}.txt");
    assert_eq!(out[0].citation.as_str(), "410 U.S. 113");
    assert_eq!(out[0].count, 2);
}
