use anyhow::Result;
use calamine::{open_workbook, Data, Reader, Xlsx};
use orgrep::core::errors::Error;
use orgrep::models::{MatchRow, RunMetadata};
use orgrep::services::report::{write_report, RESULT_HEADERS};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use time::macros::datetime;

fn metadata() -> RunMetadata {
    RunMetadata::new(
        datetime!(2024-05-01 09:30:00 UTC),
        "octocat",
        "acme",
        "TODO_SECRET",
        7,
    )
}

fn sheet_rows(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

#[test]
fn writes_metadata_and_results_sheets() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("Outputs").join("Extras").join("Data_collected.xlsx");
    let rows = vec![
        MatchRow::new("github.com", "acme", "svc", "main", "config.yaml", 12),
        MatchRow::new("github.com", "acme", "web", "dev", "src/app.js", 3),
    ];

    write_report(&rows, &metadata(), &path)?;

    let mut workbook: Xlsx<_> = open_workbook(&path)?;
    assert_eq!(workbook.sheet_names(), vec!["Metadata", "Results"]);

    let meta = workbook.worksheet_range("Metadata")?;
    assert_eq!(meta.get_size(), (6, 2));
    assert_eq!(
        meta.get_value((1, 1)),
        Some(&Data::String("2024-05-01 09:30:00".into()))
    );
    assert_eq!(meta.get_value((2, 0)), Some(&Data::String("Current User's Login".into())));
    assert_eq!(meta.get_value((2, 1)), Some(&Data::String("octocat".into())));
    assert_eq!(meta.get_value((5, 1)), Some(&Data::Float(7.0)));

    let results = sheet_rows(&path, "Results")?;
    assert_eq!(results[0], RESULT_HEADERS);
    assert_eq!(
        results[1],
        vec![
            "acme",
            "svc",
            "main",
            "config.yaml",
            "https://github.com/acme/svc/blob/main/config.yaml#L12"
        ]
    );
    assert_eq!(results.len(), 3);
    Ok(())
}

#[test]
fn empty_results_keep_the_header_row() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.xlsx");

    write_report(&[], &metadata(), &path)?;

    let results = sheet_rows(&path, "Results")?;
    assert_eq!(results, vec![RESULT_HEADERS.map(String::from).to_vec()]);

    let meta = sheet_rows(&path, "Metadata")?;
    assert_eq!(meta.len(), 6);
    assert!(meta.iter().skip(1).all(|row| !row[1].is_empty()));
    Ok(())
}

#[test]
fn unwritable_destination_is_a_write_error() -> Result<()> {
    let dir = tempdir()?;
    let blocker = dir.path().join("Outputs");
    fs::write(&blocker, "not a directory")?;

    let result = write_report(&[], &metadata(), &blocker.join("Data_collected.xlsx"));
    match result {
        Err(err @ Error::Write { .. }) => assert!(err.is_fatal()),
        other => panic!("expected a write error, got {other:?}"),
    }
    Ok(())
}
