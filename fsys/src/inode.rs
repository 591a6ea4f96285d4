//! Inode table
//!
//! Fixed table of file records. Slot order is the listing order; deleting
//! a file frees its slot for the next insert, so listings are not sorted
//! by creation time.

use crate::error::FsError;
use crate::{FILENAME_BYTES, MAX_FILES};

/// One live file record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inode {
    pub name: String,
    /// File size in bytes
    pub size: u16,
    /// Head of the file's block chain, -1 when the file owns no blocks
    pub first_block: i16,
}

/// Directory listing entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u16,
    pub first_block: i16,
}

/// Fixed-capacity table of live files, unique by name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InodeTable {
    slots: [Option<Inode>; MAX_FILES],
}

impl InodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live files
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new record into the first free slot and return its index
    pub fn insert(&mut self, name: &str, size: u16, first_block: i16) -> Result<usize, FsError> {
        if name.len() > FILENAME_BYTES {
            return Err(FsError::NameTooLong);
        }
        if self.find(name).is_some() {
            return Err(FsError::DuplicateName);
        }
        let slot = self
            .slots
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(FsError::TableFull)?;
        self.slots[slot] = Some(Inode {
            name: name.to_owned(),
            size,
            first_block,
        });
        Ok(slot)
    }

    /// Slot index of `name`, if present
    pub fn find(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(inode) if inode.name == name))
    }

    /// Record for `name`, if present
    pub fn lookup(&self, name: &str) -> Option<&Inode> {
        self.slots.iter().flatten().find(|inode| inode.name == name)
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&Inode> {
        self.slots.get(slot)?.as_ref()
    }

    /// Point a slot's record at a new chain head and size
    pub(crate) fn set_extent(&mut self, slot: usize, size: u16, first_block: i16) {
        if let Some(inode) = self.slots.get_mut(slot).and_then(|slot| slot.as_mut()) {
            inode.size = size;
            inode.first_block = first_block;
        }
    }

    /// Place a decoded record directly into its persisted slot
    pub(crate) fn restore(&mut self, slot: usize, inode: Inode) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(inode);
        }
    }

    /// Remove `name`, returning its record
    pub fn remove(&mut self, name: &str) -> Option<Inode> {
        let slot = self.find(name)?;
        self.slots[slot].take()
    }

    /// Snapshot of all live files in slot order
    pub fn list(&self) -> Vec<FileInfo> {
        self.slots
            .iter()
            .flatten()
            .map(|inode| FileInfo {
                name: inode.name.clone(),
                size: inode.size,
                first_block: inode.first_block,
            })
            .collect()
    }
}
