//! Worksheet sync tests against real .xlsx files

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use herdbook::dates::EditDatePolicy;
use herdbook::error::HerdbookError;
use herdbook::register::Register;
use herdbook::store::{MemoryWorksheet, RowStore, SheetStore, StoreConfig, Worksheet};
use herdbook::types::{CellValue, Frame, Record, ACQUIRED, COLUMNS};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path().join("herd.xlsx"), "Ark1")
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP AND IDEMPOTENCE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_date_string_survives_commit_and_load() {
    let dir = TempDir::new().unwrap();
    let mut store = config(&dir).create().unwrap();

    let mut frame = Frame::with_default_columns();
    frame.push_record(&Record::new("Fido", "Dog").with_acquired("01/06/2022"));
    store.commit(&frame).unwrap();

    let mut reopened = config(&dir).open().unwrap();
    let loaded = reopened.load().unwrap();
    assert_eq!(loaded.columns(), frame.columns());
    assert_eq!(
        loaded.cell(0, ACQUIRED),
        Some(&CellValue::Text("01/06/2022".to_string()))
    );
}

#[test]
fn test_commit_twice_gives_same_worksheet() {
    let dir = TempDir::new().unwrap();
    let mut store = config(&dir).create().unwrap();

    let mut frame = Frame::with_default_columns();
    frame.push_record(&Record::new("Whiskers", "Cat").with_acquired(d(2022, 3, 15)));
    frame.push_record(&Record::new("Rex", "Dog").with_acquired("not-a-date"));

    store.commit(&frame).unwrap();
    let first = store.worksheet_mut().read_values().unwrap();
    store.commit(&frame).unwrap();
    let second = store.worksheet_mut().read_values().unwrap();

    assert_eq!(first, second);
    assert_eq!(first[1][2], "15/03/2022");
    assert_eq!(first[2][2], "not-a-date");
}

#[test]
fn test_create_writes_header_only() {
    let dir = TempDir::new().unwrap();
    config(&dir).create().unwrap();

    let mut store = config(&dir).open().unwrap();
    let frame = store.load().unwrap();
    assert_eq!(frame.columns(), COLUMNS.map(String::from).as_slice());
    assert!(frame.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTER OVER XLSX
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fido_whiskers_example() {
    let dir = TempDir::new().unwrap();
    let mut register = Register::open(config(&dir).create().unwrap()).unwrap();
    register
        .add(Record::new("Fido", "Dog").with_acquired("01/06/2022"))
        .unwrap();
    register
        .add(Record::new("Whiskers", "Cat").with_acquired("15/03/2022"))
        .unwrap();

    let counts = register.counts();
    assert_eq!(counts.get(2022, "Dog"), Some(1));
    assert_eq!(counts.get(2022, "Cat"), Some(1));

    register.delete(0).unwrap();

    let reopened = Register::open(config(&dir).open().unwrap()).unwrap();
    let names: Vec<String> = reopened.list().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Whiskers"]);
    let counts = reopened.counts();
    assert_eq!(counts.species, vec!["Cat"]);
    assert_eq!(counts.get(2022, "Cat"), Some(1));
}

#[test]
fn test_lenient_dates_are_rewritten_padded() {
    let dir = TempDir::new().unwrap();
    let mut register = Register::open(config(&dir).create().unwrap()).unwrap();
    register
        .add(Record::new("Hen", "Chicken").with_acquired(CellValue::Text("2/3/2023".into())))
        .unwrap();

    let mut store = config(&dir).open().unwrap();
    let values = store.worksheet_mut().read_values().unwrap();
    assert_eq!(values[1][2], "02/03/2023");
}

#[test]
fn test_extra_columns_survive_edits() {
    let dir = TempDir::new().unwrap();
    let mut store = config(&dir).create().unwrap();
    let mut frame = Frame::new(
        ["Name", "Species", "Acquired", "Disposed", "Feed", "Notes", "Tag"]
            .map(String::from)
            .to_vec(),
    );
    frame.push_row(
        ["Fido", "Dog", "01/06/2022", "", "", "", "A-17"]
            .map(CellValue::from_raw)
            .to_vec(),
    );
    store.commit(&frame).unwrap();

    let mut register = Register::open(config(&dir).open().unwrap())
        .unwrap()
        .with_policy(EditDatePolicy::Reject);
    let mut fido = register.get(0).unwrap();
    fido.notes = "Good boy".into();
    register.update(0, fido).unwrap();

    let reloaded = config(&dir).open().unwrap().load().unwrap();
    assert_eq!(reloaded.cell(0, "Tag"), Some(&CellValue::Text("A-17".into())));
    assert_eq!(reloaded.cell(0, "Notes"), Some(&CellValue::Text("Good boy".into())));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURE MODEL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_interrupted_overwrite_leaves_partial_worksheet() {
    let mut seed = SheetStore::new(MemoryWorksheet::new());
    let mut frame = Frame::with_default_columns();
    for name in ["A", "B", "C", "D"] {
        frame.push_record(&Record::new(name, "Hen").with_acquired(d(2024, 5, 1)));
    }
    seed.commit(&frame).unwrap();

    let flaky = MemoryWorksheet::with_values(seed.worksheet().values().to_vec()).fail_after(3);
    let mut register = Register::open(SheetStore::new(flaky)).unwrap();

    let err = register.delete(0).unwrap_err();
    assert!(matches!(
        err,
        HerdbookError::PartialWrite {
            written: 3,
            total: 4,
            ..
        }
    ));
    // In memory the delete happened; the worksheet holds header + 2 rows
    assert_eq!(register.len(), 3);
    assert_eq!(register.store().worksheet().values().len(), 3);
}
