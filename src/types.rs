use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

//==============================================================================
// Column layout
//==============================================================================

pub const NAME: &str = "Name";
pub const SPECIES: &str = "Species";
pub const ACQUIRED: &str = "Acquired";
pub const DISPOSED: &str = "Disposed";
pub const FEED: &str = "Feed";
pub const NOTES: &str = "Notes";

/// Canonical header, in worksheet order
pub const COLUMNS: [&str; 6] = [NAME, SPECIES, ACQUIRED, DISPOSED, FEED, NOTES];

/// Columns holding dates
pub const DATE_COLUMNS: [&str; 2] = [ACQUIRED, DISPOSED];

//==============================================================================
// Cell values
//==============================================================================

/// A single cell as held in memory.
///
/// The worksheet only stores strings. Dates become `Date` once normalized and
/// are written back as `dd/mm/yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    /// Wrap a raw worksheet string. Blank strings become `Empty`.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Interpret user input for a date field: parseable day-first text becomes
    /// `Date`, anything else is kept as text.
    pub fn from_date_input(raw: &str) -> Self {
        match Self::from_raw(raw) {
            CellValue::Text(s) => match dates::parse_day_first(&s) {
                Some(date) => CellValue::Date(date),
                None => CellValue::Text(s),
            },
            other => other,
        }
    }

    /// String written to the worksheet
    pub fn to_cell_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => dates::format_date(*d),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "Empty",
            CellValue::Text(_) => "Text",
            CellValue::Date(_) => "Date",
        }
    }
}

impl From<NaiveDate> for CellValue {
    fn from(date: NaiveDate) -> Self {
        CellValue::Date(date)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_cell_string())
    }
}

// Cells cross the API as the same strings the worksheet holds. Incoming text
// stays text; the register decides how to read it as a date.
impl Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_cell_string())
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CellValue::from_raw(&raw))
    }
}

//==============================================================================
// Records
//==============================================================================

/// One animal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub acquired: CellValue,
    /// Empty while the animal is still present
    #[serde(default)]
    pub disposed: CellValue,
    #[serde(default)]
    pub feed: String,
    #[serde(default)]
    pub notes: String,
}

impl Record {
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            ..Default::default()
        }
    }

    pub fn with_acquired(mut self, acquired: impl Into<CellValue>) -> Self {
        self.acquired = acquired.into();
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Year partition key. `None` when the acquisition date is unknown.
    pub fn year(&self) -> Option<i32> {
        self.acquired.as_date().map(|d| chrono::Datelike::year(&d))
    }

    pub fn is_present(&self) -> bool {
        self.disposed.is_empty()
    }

    fn field(&self, column: &str) -> Option<CellValue> {
        let value = match column {
            NAME => CellValue::from_raw(&self.name),
            SPECIES => CellValue::from_raw(&self.species),
            ACQUIRED => self.acquired.clone(),
            DISPOSED => self.disposed.clone(),
            FEED => CellValue::from_raw(&self.feed),
            NOTES => CellValue::from_raw(&self.notes),
            _ => return None,
        };
        Some(value)
    }
}

impl From<&str> for CellValue {
    fn from(raw: &str) -> Self {
        CellValue::from_date_input(raw)
    }
}

//==============================================================================
// Frame
//==============================================================================

/// The in-memory table: ordered columns plus rows aligned to them.
///
/// Columns unknown to [`Record`] are carried through untouched so a commit
/// never drops data someone added to the worksheet by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Frame with the canonical header and no rows
    pub fn with_default_columns() -> Self {
        Self::new(COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a raw row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Append any canonical column the frame lacks, at the end
    pub fn ensure_columns(&mut self) {
        for name in COLUMNS {
            if self.column_index(name).is_none() {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(CellValue::Empty);
                }
            }
        }
    }

    /// Typed view of one row
    pub fn record(&self, index: usize) -> Option<Record> {
        let row = self.rows.get(index)?;
        let text = |name: &str| -> String {
            self.column_index(name)
                .and_then(|c| row.get(c))
                .map(CellValue::to_cell_string)
                .unwrap_or_default()
        };
        let cell = |name: &str| -> CellValue {
            self.column_index(name)
                .and_then(|c| row.get(c))
                .cloned()
                .unwrap_or_default()
        };
        Some(Record {
            name: text(NAME),
            species: text(SPECIES),
            acquired: cell(ACQUIRED),
            disposed: cell(DISPOSED),
            feed: text(FEED),
            notes: text(NOTES),
        })
    }

    pub fn records(&self) -> Vec<Record> {
        (0..self.rows.len()).filter_map(|i| self.record(i)).collect()
    }

    pub fn push_record(&mut self, record: &Record) {
        self.ensure_columns();
        let row = self
            .columns
            .iter()
            .map(|c| record.field(c).unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    /// Overwrite the known fields of a row; extra columns keep their values.
    /// Returns `false` when the index is out of range.
    pub fn set_record(&mut self, index: usize, record: &Record) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.ensure_columns();
        let columns = &self.columns;
        let row = &mut self.rows[index];
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = record.field(name) {
                row[col] = value;
            }
        }
        true
    }

    /// Remove a row; later rows shift down by one
    pub fn remove(&mut self, index: usize) -> Option<Vec<CellValue>> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    /// Convert parseable text in `column` to dates. Unparseable text stays as
    /// it is. Returns the number of cells left as non-date text.
    pub fn normalize_dates(&mut self, column: &str) -> usize {
        let Some(col) = self.column_index(column) else {
            return 0;
        };
        let mut unparsed = 0;
        for row in &mut self.rows {
            if let CellValue::Text(raw) = &row[col] {
                match dates::parse_day_first(raw) {
                    Some(date) => row[col] = CellValue::Date(date),
                    None => unparsed += 1,
                }
            }
        }
        unparsed
    }

    /// Header followed by every row, as the strings written to the worksheet
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.columns.clone())
            .chain(
                self.rows
                    .iter()
                    .map(|row| row.iter().map(CellValue::to_cell_string).collect()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_cell_from_raw_blank_is_empty() {
        assert_eq!(CellValue::from_raw(""), CellValue::Empty);
        assert_eq!(CellValue::from_raw("   "), CellValue::Empty);
        assert_eq!(CellValue::from_raw("Hay"), CellValue::Text("Hay".into()));
    }

    #[test]
    fn test_cell_date_input() {
        assert_eq!(
            CellValue::from_date_input("01/06/2022"),
            CellValue::Date(d(2022, 6, 1))
        );
        assert_eq!(
            CellValue::from_date_input("not-a-date"),
            CellValue::Text("not-a-date".into())
        );
    }

    #[test]
    fn test_deserialized_dates_stay_text() {
        let record: Record =
            serde_json::from_str(r#"{"name": "Fido", "acquired": "2021-07-04", "disposed": " "}"#)
                .unwrap();
        assert_eq!(record.acquired, CellValue::Text("2021-07-04".into()));
        assert_eq!(record.disposed, CellValue::Empty);
        assert_eq!(record.species, "");
    }

    #[test]
    fn test_cell_string_pads_dates() {
        assert_eq!(CellValue::Date(d(2023, 2, 5)).to_cell_string(), "05/02/2023");
        assert_eq!(CellValue::Empty.to_cell_string(), "");
    }

    #[test]
    fn test_record_year() {
        let dated = Record::new("Fido", "Dog").with_acquired(d(2022, 6, 1));
        assert_eq!(dated.year(), Some(2022));

        let undated = Record::new("Rex", "Dog").with_acquired("not-a-date");
        assert_eq!(undated.year(), None);
        assert!(undated.is_present());
    }

    #[test]
    fn test_frame_keeps_extra_columns() {
        let mut frame = Frame::new(vec!["Name".into(), "Tag".into()]);
        frame.push_row(vec![CellValue::from_raw("Fido"), CellValue::from_raw("A-17")]);

        let mut record = frame.record(0).unwrap();
        record.species = "Dog".into();
        assert!(frame.set_record(0, &record));

        assert_eq!(frame.columns()[..2], ["Name".to_string(), "Tag".to_string()]);
        assert_eq!(frame.cell(0, "Tag"), Some(&CellValue::Text("A-17".into())));
        assert_eq!(frame.cell(0, SPECIES), Some(&CellValue::Text("Dog".into())));
    }

    #[test]
    fn test_frame_push_row_pads() {
        let mut frame = Frame::with_default_columns();
        frame.push_row(vec![CellValue::from_raw("Fido")]);
        assert_eq!(frame.rows()[0].len(), COLUMNS.len());
    }

    #[test]
    fn test_normalize_dates_retains_unparseable() {
        let mut frame = Frame::with_default_columns();
        frame.push_record(&Record::new("Fido", "Dog").with_acquired(CellValue::Text("1/6/2022".into())));
        frame.push_record(&Record::new("Rex", "Dog").with_acquired(CellValue::Text("soon".into())));

        let unparsed = frame.normalize_dates(ACQUIRED);

        assert_eq!(unparsed, 1);
        assert_eq!(frame.cell(0, ACQUIRED), Some(&CellValue::Date(d(2022, 6, 1))));
        assert_eq!(frame.cell(1, ACQUIRED), Some(&CellValue::Text("soon".into())));
    }

    #[test]
    fn test_set_record_out_of_range() {
        let mut frame = Frame::with_default_columns();
        assert!(!frame.set_record(0, &Record::default()));
        assert!(frame.remove(0).is_none());
    }

    #[test]
    fn test_to_string_rows_starts_with_header() {
        let mut frame = Frame::with_default_columns();
        frame.push_record(&Record::new("Fido", "Dog").with_acquired(d(2022, 6, 1)));
        let rows = frame.to_string_rows();
        assert_eq!(rows[0], COLUMNS.map(String::from).to_vec());
        assert_eq!(rows[1], vec!["Fido", "Dog", "01/06/2022", "", "", ""]);
    }
}
