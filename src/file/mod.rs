//! Byte sources and low-level parsing for pin databases.
//!
//! A distributor can ship an updated pin list as a file next to the application. [`File`] maps
//! it read-only so several processes share the same pages, and [`Parser`] decodes the container
//! with bounds-checked little-endian reads.
//!
//! # Key Components
//!
//! - [`File`] - A memory-mapped database file
//! - [`Parser`] - Cursor for little-endian primitives and length-prefixed strings
//! - [`io`] - The primitive read and write helpers

pub mod io;
pub mod parser;

pub use parser::Parser;

use std::{fs, path::Path};

use memmap2::Mmap;

use crate::{Error, Result};

/// A memory-mapped, read-only database file.
#[derive(Debug)]
pub struct File {
    data: Mmap,
}

impl File {
    /// Open and map the file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be opened or mapped, and [`Error::Empty`]
    /// for a zero-length file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<File> {
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::Empty);
        }

        // SAFETY: the mapping is read-only. Truncation of the file by another process while
        // mapped is not guarded against.
        let data = unsafe { Mmap::map(&file) }?;

        Ok(File { data })
    }

    /// The mapped contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
