//! Worksheet inside a local `.xlsx` workbook
//!
//! Reads go through calamine, writes through rust_xlsxwriter. rust_xlsxwriter
//! can only write whole workbooks, so `clear` and `append_row` edit an
//! in-memory copy and `flush` saves the file once with all of its worksheets.
//! The other worksheets are kept as plain strings.

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::dates::format_date;
use crate::error::{HerdbookError, HerdbookResult};

use super::Worksheet;

pub struct XlsxWorksheet {
    path: PathBuf,
    /// Every worksheet of the workbook in file order
    sheets: Vec<(String, Vec<Vec<String>>)>,
    /// Index of ours in `sheets`
    target: usize,
    /// Number of times the file has been written
    saves: usize,
}

impl XlsxWorksheet {
    /// Open an existing workbook. The worksheet must already exist.
    pub fn open<P: AsRef<Path>>(path: P, sheet: &str) -> HerdbookResult<Self> {
        let path = path.as_ref().to_path_buf();
        let sheets = read_workbook(&path).map_err(|e| HerdbookError::Open(e.to_string()))?;
        let target = sheets
            .iter()
            .position(|(name, _)| name == sheet)
            .ok_or_else(|| {
                HerdbookError::Open(format!(
                    "worksheet '{}' not found in {}",
                    sheet,
                    path.display()
                ))
            })?;
        Ok(Self {
            path,
            sheets,
            target,
            saves: 0,
        })
    }

    /// Create a new workbook containing one empty worksheet. Overwrites any
    /// file already at `path`.
    pub fn create<P: AsRef<Path>>(path: P, sheet: &str) -> HerdbookResult<Self> {
        let mut worksheet = Self {
            path: path.as_ref().to_path_buf(),
            sheets: vec![(sheet.to_string(), Vec::new())],
            target: 0,
            saves: 0,
        };
        worksheet.save()?;
        Ok(worksheet)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheets[self.target].0
    }

    fn save(&mut self) -> HerdbookResult<()> {
        let mut workbook = Workbook::new();
        for (name, values) in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(name)
                .map_err(|e| HerdbookError::Write(format!("Failed to set worksheet name: {}", e)))?;
            for (row, cells) in values.iter().enumerate() {
                for (col, value) in cells.iter().enumerate() {
                    worksheet
                        .write_string(row as u32, col as u16, value)
                        .map_err(|e| HerdbookError::Write(format!("Failed to write cell: {}", e)))?;
                }
            }
        }
        workbook
            .save(&self.path)
            .map_err(|e| HerdbookError::Write(format!("Failed to save Excel file: {}", e)))?;
        self.saves += 1;
        debug!(path = %self.path.display(), "saved workbook");
        Ok(())
    }
}

impl Worksheet for XlsxWorksheet {
    fn read_values(&mut self) -> HerdbookResult<Vec<Vec<String>>> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e| HerdbookError::Read(format!("Failed to open Excel file: {}", e)))?;
        let name = self.sheet_name().to_string();
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| HerdbookError::Read(format!("Failed to read worksheet '{}': {}", name, e)))?;
        let values = range_to_strings(&range);
        self.sheets[self.target].1 = values.clone();
        Ok(values)
    }

    fn clear(&mut self) -> HerdbookResult<()> {
        // Pick up edits made to the other worksheets since we opened the file
        if let Ok(sheets) = read_workbook(&self.path) {
            let ours = self.sheet_name().to_string();
            self.sheets = sheets
                .into_iter()
                .filter(|(name, _)| *name != ours)
                .collect();
            let target = self.target.min(self.sheets.len());
            self.sheets.insert(target, (ours, Vec::new()));
            self.target = target;
        } else {
            self.sheets[self.target].1.clear();
        }
        Ok(())
    }

    fn append_row(&mut self, row: &[String]) -> HerdbookResult<()> {
        self.sheets[self.target].1.push(row.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> HerdbookResult<()> {
        self.save()
    }
}

fn read_workbook(path: &Path) -> Result<Vec<(String, Vec<Vec<String>>)>, calamine::XlsxError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, range_to_strings(&range)));
    }
    Ok(sheets)
}

/// Cell strings anchored at A1. calamine ranges start at the first used cell,
/// so leading blank rows and columns are restored here.
fn range_to_strings(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let mut values: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for cells in range.rows() {
        let mut row = vec![String::new(); start_col as usize];
        row.extend(cells.iter().map(cell_to_string));
        values.push(row);
    }
    values
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(dt) => {
            excel_serial_to_date(dt.as_f64()).map_or_else(|| cell.to_string(), format_date)
        }
        other => other.to_string(),
    }
}

/// Excel serial day number to calendar date (1900 date system)
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RowStore, SheetStore};
    use crate::types::{Frame, Record};
    use tempfile::TempDir;

    fn strings(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_excel_serial_to_date() {
        // 44713 is 2022-06-01 in the 1900 date system
        assert_eq!(
            excel_serial_to_date(44713.0),
            NaiveDate::from_ymd_opt(2022, 6, 1)
        );
        assert_eq!(excel_serial_to_date(-3.0), None);
    }

    #[test]
    fn test_cell_to_string_numbers() {
        assert_eq!(cell_to_string(&Data::Float(2022.0)), "2022");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_create_then_append_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.xlsx");

        let mut sheet = XlsxWorksheet::create(&path, "Animals").unwrap();
        sheet.append_row(&strings(&["Name", "Species"])).unwrap();
        sheet.append_row(&strings(&["Fido", "Dog"])).unwrap();
        sheet.flush().unwrap();

        let mut reopened = XlsxWorksheet::open(&path, "Animals").unwrap();
        assert_eq!(
            reopened.read_values().unwrap(),
            vec![strings(&["Name", "Species"]), strings(&["Fido", "Dog"])]
        );
    }

    #[test]
    fn test_open_missing_sheet_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.xlsx");
        XlsxWorksheet::create(&path, "Animals").unwrap();

        let err = XlsxWorksheet::open(&path, "Nope").err().unwrap();
        assert!(matches!(err, HerdbookError::Open(_)));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = XlsxWorksheet::open(dir.path().join("absent.xlsx"), "Animals")
            .err()
            .unwrap();
        assert!(matches!(err, HerdbookError::Open(_)));
    }

    #[test]
    fn test_clear_keeps_other_worksheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.xlsx");

        // Two-sheet workbook written directly
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .set_name("Notes")
            .unwrap()
            .write_string(0, 0, "keep me")
            .unwrap();
        workbook.add_worksheet().set_name("Animals").unwrap();
        workbook.save(&path).unwrap();

        let mut sheet = XlsxWorksheet::open(&path, "Animals").unwrap();
        sheet.clear().unwrap();
        sheet.append_row(&strings(&["Name"])).unwrap();
        sheet.flush().unwrap();

        let mut notes = XlsxWorksheet::open(&path, "Notes").unwrap();
        assert_eq!(notes.read_values().unwrap(), vec![strings(&["keep me"])]);
        let mut animals = XlsxWorksheet::open(&path, "Animals").unwrap();
        assert_eq!(animals.read_values().unwrap(), vec![strings(&["Name"])]);
    }

    #[test]
    fn test_appends_are_not_saved_until_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.xlsx");

        let mut sheet = XlsxWorksheet::create(&path, "Animals").unwrap();
        sheet.append_row(&strings(&["Name"])).unwrap();
        assert!(XlsxWorksheet::open(&path, "Animals")
            .unwrap()
            .read_values()
            .unwrap()
            .is_empty());

        sheet.flush().unwrap();
        assert_eq!(
            XlsxWorksheet::open(&path, "Animals").unwrap().read_values().unwrap(),
            vec![strings(&["Name"])]
        );
    }

    #[test]
    fn test_commit_saves_workbook_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("register.xlsx");
        XlsxWorksheet::create(&path, "Animals").unwrap();

        let mut frame = Frame::with_default_columns();
        for i in 0..50 {
            frame.push_record(&Record::new(format!("Hen {i}"), "Chicken"));
        }

        let mut store = SheetStore::new(XlsxWorksheet::open(&path, "Animals").unwrap());
        store.commit(&frame).unwrap();
        assert_eq!(store.worksheet().saves, 1);

        store.commit(&frame).unwrap();
        assert_eq!(store.worksheet().saves, 2);
        assert_eq!(store.load().unwrap().len(), 50);
    }
}
