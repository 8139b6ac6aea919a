//! The animal register
//!
//! Holds the loaded frame and applies `add`, `update` and `delete`. Every
//! mutation is followed by a full commit of the frame to the store.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dates::{self, EditDatePolicy};
use crate::error::{HerdbookError, HerdbookResult};
use crate::partition::{CountTable, YearPartition};
use crate::store::RowStore;
use crate::types::{CellValue, Frame, Record, DATE_COLUMNS};

pub struct Register<S: RowStore> {
    store: S,
    frame: Frame,
    policy: EditDatePolicy,
    today: fn() -> NaiveDate,
}

impl<S: RowStore> Register<S> {
    /// Load the store and normalize its date columns
    pub fn open(mut store: S) -> HerdbookResult<Self> {
        let frame = load_normalized(&mut store)?;
        Ok(Self {
            store,
            frame,
            policy: EditDatePolicy::default(),
            today: dates::today,
        })
    }

    pub fn with_policy(mut self, policy: EditDatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the source of "today" used by edit-time date fallbacks
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn policy(&self) -> EditDatePolicy {
        self.policy
    }

    /// Today's date as seen by this register's clock
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// All records in register order. Records with an unknown acquisition
    /// date are included.
    pub fn list(&self) -> Vec<Record> {
        self.frame.records()
    }

    pub fn get(&self, index: usize) -> HerdbookResult<Record> {
        self.frame.record(index).ok_or(HerdbookError::NoSuchRecord {
            index,
            len: self.frame.len(),
        })
    }

    /// Append a record and commit. Returns its index.
    ///
    /// Date fields are stored as given, except that parseable text becomes a
    /// date. Unparseable text is kept and leaves the record out of the year
    /// views.
    pub fn add(&mut self, record: Record) -> HerdbookResult<usize> {
        let record = Record {
            acquired: normalize_cell(record.acquired),
            disposed: normalize_cell(record.disposed),
            ..record
        };
        self.frame.push_record(&record);
        let index = self.frame.len() - 1;
        info!(index, name = %record.name, species = %record.species, "adding record");
        self.persist()?;
        Ok(index)
    }

    /// Replace the fields of the record at `index` and commit.
    ///
    /// The acquisition date is resolved with the edit policy, so a blank or
    /// (under the default policy) malformed value becomes today. A blank
    /// disposal date stays blank: the animal is still present.
    pub fn update(&mut self, index: usize, record: Record) -> HerdbookResult<Record> {
        self.get(index)?;
        let today = self.today();

        let acquired = dates::resolve_edit_date(&record.acquired, self.policy, today)?;
        let disposed = if record.disposed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Date(dates::resolve_edit_date(&record.disposed, self.policy, today)?)
        };

        let record = Record {
            acquired: CellValue::Date(acquired),
            disposed,
            ..record
        };
        self.frame.set_record(index, &record);
        info!(index, name = %record.name, "updating record");
        self.persist()?;
        Ok(record)
    }

    /// Remove the record at `index` and commit. Later records shift down.
    pub fn delete(&mut self, index: usize) -> HerdbookResult<Record> {
        let record = self.get(index)?;
        self.frame.remove(index);
        info!(index, name = %record.name, "deleting record");
        self.persist()?;
        Ok(record)
    }

    pub fn partition(&self) -> YearPartition {
        YearPartition::build(&self.list())
    }

    pub fn counts(&self) -> CountTable {
        CountTable::build(&self.list())
    }

    /// Discard in-memory state and load again from the store
    pub fn reload(&mut self) -> HerdbookResult<()> {
        self.frame = load_normalized(&mut self.store)?;
        Ok(())
    }

    /// Commit the current frame again, e.g. after a failed overwrite
    pub fn sync(&mut self) -> HerdbookResult<()> {
        self.persist()
    }

    fn persist(&mut self) -> HerdbookResult<()> {
        self.store.commit(&self.frame).inspect_err(|e| {
            warn!(error = %e, "commit failed, in-memory register and store have diverged");
        })
    }
}

fn load_normalized<S: RowStore>(store: &mut S) -> HerdbookResult<Frame> {
    let mut frame = store.load()?;
    for column in DATE_COLUMNS {
        let unparsed = frame.normalize_dates(column);
        if unparsed > 0 {
            warn!(column, unparsed, "cells are not dates, rows kept without a year");
        }
    }
    Ok(frame)
}

fn normalize_cell(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(raw) => CellValue::from_date_input(&raw),
        other => other,
    }
}
