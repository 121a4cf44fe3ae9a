//! Write-once cells for values discovered during a suite run
//!
//! A suite learns some identifiers as it goes (the template it created, the
//! cluster it is working on). Each is recorded exactly once and read by later
//! steps; writing twice or reading before the write is a bug in the suite and
//! surfaces as an error rather than a silent overwrite.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// A named value that may be set once and read many times
pub struct WriteOnce<T> {
    name: &'static str,
    cell: OnceLock<T>,
}

impl<T> WriteOnce<T> {
    /// Create an empty cell
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
        }
    }

    /// The cell's name, used in error messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record the value; fails if it was already recorded
    pub fn set(&self, value: T) -> Result<()> {
        self.cell
            .set(value)
            .map_err(|_| Error::ContextAlreadySet { name: self.name })
    }

    /// Read the value; fails if it has not been recorded yet
    pub fn get(&self) -> Result<&T> {
        self.cell
            .get()
            .ok_or(Error::ContextNotSet { name: self.name })
    }

    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteOnce<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOnce")
            .field("name", &self.name)
            .field("value", &self.cell.get())
            .finish()
    }
}
