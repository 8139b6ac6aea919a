//! Remote store adapter
//!
//! A worksheet is treated as a row-oriented table whose first row is the
//! header. [`RowStore`] is the boundary the register talks to: load a
//! [`Frame`], commit a [`Frame`]. [`SheetStore`] implements it as a full
//! destructive overwrite over any [`Worksheet`] backend.

mod memory;
mod xlsx;

pub use memory::MemoryWorksheet;
pub use xlsx::XlsxWorksheet;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{HerdbookError, HerdbookResult};
use crate::types::{CellValue, Frame};

/// Default worksheet name
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Minimal worksheet operations. All cells are strings.
pub trait Worksheet {
    /// Every row, header first. An empty worksheet yields no rows.
    fn read_values(&mut self) -> HerdbookResult<Vec<Vec<String>>>;

    /// Remove all content
    fn clear(&mut self) -> HerdbookResult<()>;

    /// Append one row after the last one
    fn append_row(&mut self, row: &[String]) -> HerdbookResult<()>;

    /// Persist buffered writes. Backends that write through need not override.
    fn flush(&mut self) -> HerdbookResult<()> {
        Ok(())
    }
}

/// Load/commit boundary between the register and its persistence.
///
/// `commit` replaces the whole stored table with the snapshot. Implementations
/// may diff or batch internally as long as the stored result equals the
/// snapshot.
pub trait RowStore {
    fn load(&mut self) -> HerdbookResult<Frame>;

    fn commit(&mut self, snapshot: &Frame) -> HerdbookResult<()>;
}

impl<T: RowStore + ?Sized> RowStore for Box<T> {
    fn load(&mut self) -> HerdbookResult<Frame> {
        (**self).load()
    }

    fn commit(&mut self, snapshot: &Frame) -> HerdbookResult<()> {
        (**self).commit(snapshot)
    }
}

/// Store handle shared with the HTTP server
pub type DynStore = Box<dyn RowStore + Send>;

/// Full-overwrite store over a worksheet
pub struct SheetStore<W: Worksheet> {
    sheet: W,
}

impl<W: Worksheet> SheetStore<W> {
    pub fn new(sheet: W) -> Self {
        Self { sheet }
    }

    pub fn worksheet(&self) -> &W {
        &self.sheet
    }

    pub fn worksheet_mut(&mut self) -> &mut W {
        &mut self.sheet
    }

    pub fn into_inner(self) -> W {
        self.sheet
    }
}

impl<W: Worksheet> RowStore for SheetStore<W> {
    /// Read the worksheet into a frame. No filtering and no date parsing
    /// happen here; blank cells become `Empty`.
    fn load(&mut self) -> HerdbookResult<Frame> {
        let mut values = self.sheet.read_values()?.into_iter();
        let Some(header) = values.next() else {
            info!("worksheet is empty");
            return Ok(Frame::default());
        };

        let mut frame = Frame::new(header);
        for row in values {
            frame.push_row(row.iter().map(|v| CellValue::from_raw(v)).collect());
        }
        info!(rows = frame.len(), columns = frame.columns().len(), "loaded worksheet");
        Ok(frame)
    }

    /// Clear the worksheet, write the header, then every row in frame order,
    /// and flush once at the end.
    ///
    /// Not atomic: if an append fails the worksheet keeps whatever was written
    /// so far and [`HerdbookError::PartialWrite`] reports how far it got. A
    /// failed flush is returned as is.
    fn commit(&mut self, snapshot: &Frame) -> HerdbookResult<()> {
        let rows = snapshot.to_string_rows();
        let total = rows.len();

        self.sheet.clear()?;
        for (written, row) in rows.iter().enumerate() {
            if let Err(e) = self.sheet.append_row(row) {
                warn!(written, total, error = %e, "overwrite interrupted, worksheet is inconsistent");
                return Err(HerdbookError::PartialWrite {
                    written,
                    total,
                    reason: e.to_string(),
                });
            }
            debug!(row = written, "appended row");
        }
        self.sheet.flush().inspect_err(|e| {
            warn!(total, error = %e, "flush failed, worksheet may not hold the snapshot");
        })?;
        info!(rows = snapshot.len(), "committed worksheet");
        Ok(())
    }
}

/// Where the register lives: a workbook file and a worksheet inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub sheet: String,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    /// Open the configured worksheet. Failure here is fatal for callers.
    pub fn open(&self) -> HerdbookResult<SheetStore<XlsxWorksheet>> {
        Ok(SheetStore::new(XlsxWorksheet::open(&self.path, &self.sheet)?))
    }

    /// Create a fresh workbook holding only the canonical header
    pub fn create(&self) -> HerdbookResult<SheetStore<XlsxWorksheet>> {
        let mut store = SheetStore::new(XlsxWorksheet::create(&self.path, &self.sheet)?);
        store.commit(&Frame::with_default_columns())?;
        Ok(store)
    }
}
