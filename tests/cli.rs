mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use common::{xlsx, XCell};
use serde_json::Value;
use tempfile::TempDir;

fn sheet_lookup(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheet-lookup"))
        .arg("--store")
        .arg(store)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// Exit code and stdout parsed as JSON.
fn run_json(store: &Path, args: &[&str]) -> (i32, Value) {
    let output = sheet_lookup(store, args);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let json = serde_json::from_str(&stdout).unwrap_or_else(|error| panic!("{error}: {stdout}"));
    (output.status.code().unwrap(), json)
}

/// Uploads `bytes` as `name` and returns the stored reference.
fn upload(store: &Path, name: &str, mime: &str, bytes: &[u8]) -> String {
    let source = store.join("incoming");
    fs::create_dir_all(&source).unwrap();
    let path = source.join(name);
    fs::write(&path, bytes).unwrap();
    let (code, json) = run_json(store, &["upload", path.to_str().unwrap(), "--mime", mime]);
    assert_eq!(code, 0, "{json}");
    json["filePath"].as_str().unwrap().to_owned()
}

fn two_sheet_book() -> Vec<u8> {
    xlsx(
        &[],
        &[
            ("One", vec![vec![XCell::Inline("A1", "id")], vec![XCell::Number("A2", "1")]]),
            (
                "Two",
                vec![
                    vec![XCell::Inline("A1", "id"), XCell::Inline("B1", "name")],
                    vec![XCell::Inline("A2", "t1"), XCell::Inline("B2", "Tess")],
                ],
            ),
        ],
    )
}

#[test]
fn search_uses_recorded_kind() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "people", "text/csv", b"id,name\n1,Alice\n2,Bob\n");

    let (code, json) = run_json(dir.path(), &["search", &file, "2"]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["name"], "Bob");

    let (code, json) = run_json(dir.path(), &["search", &file, "9"]);
    assert_eq!(code, 1);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No data found for ID: 9");

    // an explicit kind still wins over the record
    let (code, json) = run_json(dir.path(), &["search", &file, "2", "--kind", "workbook"]);
    assert_eq!(code, 1);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Unreadable workbook"), "{json}");
}

#[test]
fn read_names_the_original_file() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "people.csv", "", b"id,name\n1,Alice\n");

    let (code, json) = run_json(dir.path(), &["read", &file]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["data"]["fileName"], "people.csv");
    assert_eq!(json["data"]["columns"], serde_json::json!(["id", "name"]));
    assert_eq!(json["allSheets"].as_array().unwrap().len(), 1);
}

#[test]
fn export_selected_sheet() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "book.xlsx", "", &two_sheet_book());
    let target = dir.path().join("two.csv");

    let output = sheet_lookup(dir.path(), &["export", &file, "--sheet", "Two", "-o", target.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(fs::read_to_string(&target).unwrap(), "id,name\nt1,Tess");

    let output = sheet_lookup(dir.path(), &["export", &file]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "id\n1\n");
}

#[test]
fn export_unknown_sheet_fails() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "book.xlsx", "", &two_sheet_book());

    let (code, json) = run_json(dir.path(), &["export", &file, "--sheet", "Missing"]);
    assert_eq!(code, 1);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("sheet 'Missing' not found"), "{json}");
}

#[test]
fn list_pages_and_filters() {
    let dir = TempDir::new().unwrap();
    upload(dir.path(), "a.csv", "", b"id\n1\n");
    upload(dir.path(), "b.csv", "", b"id\n2\n");
    let book = upload(dir.path(), "book.xlsx", "", &two_sheet_book());

    let (code, json) = run_json(dir.path(), &["list"]);
    assert_eq!(code, 0);
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (_, json) = run_json(dir.path(), &["list", "--type", "workbook"]);
    let uploads = json.as_array().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0]["filePath"], book.as_str());
    assert_eq!(uploads[0]["sheetCount"], 2);

    let (_, json) = run_json(dir.path(), &["list", "--type", "csv", "--limit", "1"]);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (_, json) = run_json(dir.path(), &["list", "--page", "2", "--limit", "2"]);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let output = sheet_lookup(dir.path(), &["list", "--page", "0"]);
    assert!(!output.status.success());
}

#[test]
fn info_and_delete() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "people.csv", "text/csv", b"id\n1\n");

    let (code, json) = run_json(dir.path(), &["info", &file]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["file"]["originalName"], "people.csv");
    assert_eq!(json["file"]["fileType"], "csv");

    let (code, json) = run_json(dir.path(), &["delete", &file]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["message"], "File deleted successfully");

    let (code, json) = run_json(dir.path(), &["search", &file, "1"]);
    assert_eq!(code, 1);
    assert!(json["error"].as_str().unwrap().contains("File not found"), "{json}");

    let (code, json) = run_json(dir.path(), &["info", &file]);
    assert_eq!(code, 1);
    assert_eq!(json["error"], "File not found");

    let (code, _) = run_json(dir.path(), &["delete", &file]);
    assert_eq!(code, 1);
}

#[test]
fn log_file_with_timestamps_redacts_values() {
    let dir = TempDir::new().unwrap();
    let file = upload(dir.path(), "people.csv", "", b"id,name\nzq-77,Bob\n");
    let log = dir.path().join("lookup.log");
    let log_arg = log.to_str().unwrap();

    let (code, json) = run_json(
        dir.path(),
        &["-v", "--log-file", log_arg, "--log-format", "compact", "--log-timestamps", "search", &file, "zq-77"],
    );
    assert_eq!(code, 0, "{json}");
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("identifier lookup"), "{text}");
    assert!(text.contains("[REDACTED]"), "{text}");
    assert!(!text.contains("zq-77"), "{text}");
    assert!(text.lines().all(|line| line.starts_with(|c: char| c.is_ascii_digit())), "{text}");

    run_json(dir.path(), &["-v", "--log-file", log_arg, "--log-values", "search", &file, "zq-77"]);
    assert!(fs::read_to_string(&log).unwrap().contains("zq-77"));
}
