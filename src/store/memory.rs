use crate::error::{HerdbookError, HerdbookResult};

use super::Worksheet;

/// In-process worksheet
#[derive(Debug, Clone, Default)]
pub struct MemoryWorksheet {
    values: Vec<Vec<String>>,
    /// Appends allowed after a clear before writes start failing
    fail_after: Option<usize>,
    appended: usize,
    flushes: usize,
}

impl MemoryWorksheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Vec<Vec<String>>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    /// Make every append after the first `n` following a clear fail, to
    /// simulate a connection dropping mid-overwrite.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn values(&self) -> &[Vec<String>] {
        &self.values
    }

    /// How many times `flush` has been called
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Worksheet for MemoryWorksheet {
    fn read_values(&mut self) -> HerdbookResult<Vec<Vec<String>>> {
        Ok(self.values.clone())
    }

    fn clear(&mut self) -> HerdbookResult<()> {
        self.values.clear();
        self.appended = 0;
        Ok(())
    }

    fn append_row(&mut self, row: &[String]) -> HerdbookResult<()> {
        if self.fail_after.is_some_and(|n| self.appended >= n) {
            return Err(HerdbookError::Write("connection lost".to_string()));
        }
        self.values.push(row.to_vec());
        self.appended += 1;
        Ok(())
    }

    fn flush(&mut self) -> HerdbookResult<()> {
        self.flushes += 1;
        Ok(())
    }
}
