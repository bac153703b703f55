use std::fs;
use std::io::Write;
use std::path::Path;

use journey2html::{compile, exit_code, DEFAULT_CSS};
use zip::write::SimpleFileOptions;

fn write_backup(path: &Path, members: &[(&str, &[u8])]) {
    let file = fs::File::create(path).unwrap();
    let mut backup = zip::ZipWriter::new(file);
    for (name, contents) in members {
        backup
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        backup.write_all(contents).unwrap();
    }
    backup.finish().unwrap();
}

fn entry(date_journal: i64, address: &str, text: &str, photos: &[&str]) -> Vec<u8> {
    serde_json::json!({
        "date_journal": date_journal,
        "address": address,
        "text": text,
        "photos": photos,
        "tags": [],
        "favourite": false,
    })
    .to_string()
    .into_bytes()
}

#[test]
fn backup_becomes_a_journal_page() {
    let scratch = tempfile::tempdir().unwrap();
    let zipfile = scratch.path().join("journey-test.zip");
    let pier = entry(
        1497528000000,
        "Harbor Rd 9",
        "Out on the **pier**",
        &["pier.jpg"],
    );
    let walk = entry(1509022007088, "Main St 1", "# Rainy\n\nA *long* walk", &[]);
    write_backup(
        &zipfile,
        &[
            // newest first in the archive, to prove the page reorders them
            ("1509022007088-walk.json", walk.as_slice()),
            ("1497528000000-pier.json", pier.as_slice()),
            ("pier.jpg", b"\xff\xd8\xff\xe0fake jpeg".as_slice()),
        ],
    );

    let outdir = scratch.path().join("journey-test");
    compile(&zipfile, &outdir, DEFAULT_CSS).unwrap();

    // photos land next to the page so bare-filename srcs resolve
    assert!(outdir.join("pier.jpg").exists());
    assert!(outdir.join("styles.css").exists());

    let html = fs::read_to_string(outdir.join("index.html")).unwrap();
    assert!(html.contains(r#"<meta charset="UTF-8">"#));
    assert!(html.contains("<title>journey-test</title>"));
    assert!(html.contains(DEFAULT_CSS));
    assert!(html.contains("<strong>pier</strong>"));
    assert!(html.contains("<h1>Rainy</h1>"));
    assert!(html.contains(r#"<img src="pier.jpg" width="600">"#));

    // chronological order: the pier entry predates the walk
    let pier_at = html.find("Harbor Rd 9").unwrap();
    let walk_at = html.find("Main St 1").unwrap();
    assert!(pier_at < walk_at);
}

#[test]
fn backup_without_entries_still_renders() {
    let scratch = tempfile::tempdir().unwrap();
    let zipfile = scratch.path().join("journey-empty.zip");
    write_backup(&zipfile, &[("cover.jpg", b"\xff\xd8\xff".as_slice())]);

    let outdir = scratch.path().join("journey-empty");
    compile(&zipfile, &outdir, DEFAULT_CSS).unwrap();

    let html = fs::read_to_string(outdir.join("index.html")).unwrap();
    assert!(html.contains("<body>"));
    assert!(!html.contains("<h1>"));
}

#[test]
fn malformed_entry_maps_to_exit_10() {
    let scratch = tempfile::tempdir().unwrap();
    let zipfile = scratch.path().join("journey-bad.zip");
    write_backup(&zipfile, &[("broken.json", b"{not json".as_slice())]);

    let outdir = scratch.path().join("journey-bad");
    let err = compile(&zipfile, &outdir, DEFAULT_CSS).unwrap_err();
    assert_eq!(exit_code(&err), 10);
}

#[test]
fn missing_backup_maps_to_exit_20() {
    let scratch = tempfile::tempdir().unwrap();
    let zipfile = scratch.path().join("nope.zip");

    let outdir = scratch.path().join("nope");
    let err = compile(&zipfile, &outdir, DEFAULT_CSS).unwrap_err();
    assert_eq!(exit_code(&err), 20);
}
