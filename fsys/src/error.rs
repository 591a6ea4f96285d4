//! File system error types

use thiserror::Error;

use crate::{FILENAME_BYTES, MAX_FILES};

/// Failures surfaced by file system operations
///
/// Display strings double as the reason texts sent back to clients, so
/// their wording is part of the wire contract.
#[derive(Debug, Error)]
pub enum FsError {
    /// Empty filename argument
    #[error("File name cannot be empty.")]
    EmptyName,

    /// Empty content passed to a write
    #[error("Make sure to enter valid content to write.")]
    EmptyContent,

    /// Filename does not fit the fixed on-disk field
    #[error("File name too long: maximum {} bytes.", FILENAME_BYTES)]
    NameTooLong,

    /// Another live file already uses the name
    #[error("File with that name already exists.")]
    DuplicateName,

    /// No inode slot left
    #[error(
        "File system full. Maximum number of {} reached. Delete a file before creating a new one.",
        MAX_FILES
    )]
    TableFull,

    /// No free block left for a new file's reserved block
    #[error("No free space available to create new file. Delete some files to free up space.")]
    NoFreeBlock,

    /// Write needs more blocks than the file system can provide
    #[error("Not enough free space: need {needed} blocks, available {available}")]
    NoSpace { needed: usize, available: usize },

    /// No live file with the given name
    #[error("File not found. Verify the filename and try again.")]
    NotFound,

    /// Metadata region failed the magic or version check
    #[error("Metadata region is absent or incompatible.")]
    CorruptMetadata,

    /// Backing store failure; in-memory state is rolled back by the caller
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
